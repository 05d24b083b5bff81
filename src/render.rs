use crate::contexts::MakefileContext;
use crate::error::GomakerError;
use crate::options::BuildFlags;
use crate::project::Project;
use crate::templates::MAKEFILE;
use chrono::Local;
use serde::Serialize;
use tinytemplate::TinyTemplate;

/// Builds the template context for `project` from the accumulated fragments.
///
/// With the `commit` option the version gets a trailing dot so that
/// `RELEASE=$(VERSION)$(COMMIT)` reads `v1.2.3.abc1234`.
pub fn makefile_context(project: &Project, flags: &BuildFlags, version: &str) -> MakefileContext {
    let version = if flags.commit && !version.is_empty() {
        format!("{}.", version.trim_end_matches('.'))
    } else {
        version.to_string()
    };

    MakefileContext {
        project_name: project.name.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        date: Local::now().format("%Y-%m-%d").to_string(),
        version,
        variables: flags.variables.clone(),
        build_command: flags.build_command(),
    }
}

pub fn render<T: Serialize>(template: &str, ctx: &T) -> Result<String, GomakerError> {
    let mut tt = TinyTemplate::new();
    // Makefile text, not HTML
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("tpl", template)
        .map_err(|e| GomakerError::Template(e.to_string()))?;
    tt.render("tpl", ctx)
        .map_err(|e| GomakerError::Template(e.to_string()))
}

/// The generated Makefile, one entry per line.
pub fn makefile_lines(ctx: &MakefileContext) -> Result<Vec<String>, GomakerError> {
    let content = render(MAKEFILE, ctx)?;
    Ok(content.lines().map(str::to_string).collect())
}
