pub const MAKEFILE: &str = include_str!("templates/Makefile.tmpl");
