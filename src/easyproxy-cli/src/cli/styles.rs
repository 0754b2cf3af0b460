//! CLI styling and formatting.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Help output theme.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with examples, environment variables and paths.
pub const AFTER_HELP: &str = color_print::cstr!(
    r#"<cyan,bold>EXAMPLES</>
    <green,bold>easyproxy check</> <dim>proxy.example.com:8080</>
    <green,bold>easyproxy bypass</> <dim>"127.0.0.1, localhost ,, intranet"</>
    <green,bold>easyproxy build</> <dim>--address proxy:3128 --auth --user alice --password s3cret</>
    <green,bold>easyproxy edit</> <dim>--from current.toml</>

<cyan,bold>ENVIRONMENT VARIABLES</>
    <yellow>EASYPROXY_HOME</>        Override the settings directory (default: ~/.easyproxy)
    <yellow>EASYPROXY_LOG_LEVEL</>   Log verbosity (error, warn, info, debug, trace)
    <yellow>NO_COLOR</>              Disable colored output

<cyan,bold>PATHS</>
    <dim>Settings</>    ~/.easyproxy/config.toml"#
);
