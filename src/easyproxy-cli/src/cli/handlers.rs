//! Command dispatch and execution handlers.
//!
//! Handlers write their results to the writer they are given so they can be
//! exercised without a terminal. Status messages go to stderr.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::{self, BufRead, Write};
use std::path::Path;

use easyproxy_core::{
    MemoryProxyService, ProxyConfig, ProxyInput, ProxyType, ServiceProxyStore, WizardOutcome,
    invoke_empty_wizard, invoke_wizard, parse_host_port, parse_non_proxy_hosts,
    seed_default_non_proxy_hosts,
};

use super::args::*;
use crate::config::{CliConfig, LoadedConfig};
use crate::prompt::PromptDriver;
use crate::styled_output::{print_info, print_success, print_warning};

/// Dispatch a CLI command to its handler.
pub fn dispatch_command(cli: Cli, loaded: &LoadedConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Check(cmd) => run_check(&cmd, &mut out),
        Commands::Bypass(cmd) => run_bypass(&cmd, &mut out),
        Commands::Build(cmd) => run_build(&cmd, &loaded.config, &mut out),
        Commands::Edit(cmd) => {
            let stdin = io::stdin();
            run_edit(&cmd, &loaded.config, stdin.lock(), io::stderr(), &mut out)
        }
        Commands::Config(cmd) => run_config(&cmd, loaded, &mut out),
        Commands::Completion(cmd) => handle_completion(cmd),
    }
}

/// Validate a `host:port` address.
pub fn run_check(cmd: &CheckCommand, out: &mut impl Write) -> Result<()> {
    let (host, port) = parse_host_port(&cmd.address)?;
    if cmd.json {
        let value = serde_json::json!({ "host": host, "port": port });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(out, "host: {}", host)?;
        writeln!(out, "port: {}", port)?;
    }
    Ok(())
}

/// Split a bypass list.
pub fn run_bypass(cmd: &BypassCommand, out: &mut impl Write) -> Result<()> {
    let mut hosts = parse_non_proxy_hosts(&cmd.list);
    if cmd.with_defaults {
        hosts = seed_default_non_proxy_hosts(hosts);
    }
    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&hosts)?)?;
    } else {
        for host in &hosts {
            writeln!(out, "{}", host)?;
        }
    }
    Ok(())
}

/// Build a configuration from flags.
pub fn run_build(cmd: &BuildCommand, config: &CliConfig, out: &mut impl Write) -> Result<()> {
    let (host, port) = parse_host_port(&cmd.address).context("Invalid --address")?;
    let editor = config.editor(cmd.strict, cmd.default_bypass);

    let proxy = editor
        .build(ProxyInput {
            reference: cmd.reference.clone(),
            host,
            port: port.into(),
            authentication_required: cmd.auth,
            user: cmd.user.clone(),
            password: cmd.password.clone(),
            non_proxy_hosts_raw: cmd.bypass.clone(),
        })
        .context("Cannot build proxy configuration")?;

    if proxy.authentication_required() && !proxy.has_usable_credentials() {
        print_warning(
            "Authentication is required but user or password is empty; \
             credentials will not be applied",
        );
    }

    let text = render_config(&proxy, config.output_format(cmd.format))?;
    writeln!(out, "{}", text)?;
    Ok(())
}

/// Run an interactive edit session and preview what applying it does.
///
/// Prompts and the preview go to `prompt_out`; the committed configuration
/// goes to `out`.
pub fn run_edit<R, W>(
    cmd: &EditCommand,
    config: &CliConfig,
    input: R,
    prompt_out: W,
    out: &mut impl Write,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let editor = config.editor(cmd.strict, cmd.default_bypass);
    let defaults = cmd.from.as_deref().map(load_proxy_file).transpose()?;

    let mut store = ServiceProxyStore::new(MemoryProxyService::new());
    let mut driver = PromptDriver::new(input, prompt_out);
    let outcome = match &defaults {
        Some(defaults) => invoke_wizard(&mut store, &mut driver, editor, Some(defaults))?,
        None => invoke_empty_wizard(&mut store, &mut driver, editor)?,
    };

    match outcome {
        WizardOutcome::Applied(proxy) => {
            let mut prompt_out = driver.into_output();
            write!(prompt_out, "{}", render_preview(store.service()))?;
            let text = render_config(&proxy, config.output_format(cmd.format))?;
            writeln!(out, "{}", text)?;
            print_success("Configuration committed");
        }
        WizardOutcome::Cancelled => print_info("Edit cancelled; nothing was applied"),
    }
    Ok(())
}

/// Show the effective settings.
pub fn run_config(cmd: &ConfigCommand, loaded: &LoadedConfig, out: &mut impl Write) -> Result<()> {
    let path = loaded
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(no home directory)".to_string());

    if cmd.json {
        let value = serde_json::json!({
            "path": path,
            "exists": loaded.path.as_ref().is_some_and(|p| p.exists()),
            "settings": loaded.config,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(out, "# {}", path)?;
        write!(out, "{}", toml::to_string_pretty(&loaded.config)?)?;
    }
    Ok(())
}

/// Read a proxy configuration from a JSON or TOML file.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_proxy_file(path: &Path) -> Result<ProxyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid proxy configuration in {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Invalid proxy configuration in {}", path.display()))?
    };
    tracing::debug!(path = %path.display(), "loaded proxy configuration");
    Ok(config)
}

/// Encode a configuration for output.
pub fn render_config(config: &ProxyConfig, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Toml => toml::to_string_pretty(config)?,
    };
    Ok(text.trim_end().to_string())
}

/// Describe the platform settings held by `service`.
pub fn render_preview(service: &MemoryProxyService) -> String {
    let on_off = |enabled: bool| if enabled { "enabled" } else { "disabled" };
    let row = |label: &str, value: &str| format!("  {:<16}{}", label, value);

    let mut lines = vec![
        "Platform proxy settings after apply:".to_string(),
        row("system proxies", on_off(service.system_proxies_enabled())),
        row("manual proxies", on_off(service.proxies_enabled())),
    ];
    for kind in ProxyType::ALL {
        let value = match service.slot(kind) {
            Some(slot) if slot.is_set() => {
                let mut value = format!("{}:{}", slot.host, slot.port);
                if slot.requires_authentication
                    && let Some(user) = &slot.user_id
                {
                    value.push_str(&format!(" (user {})", user));
                }
                value
            }
            _ => "unset".to_string(),
        };
        lines.push(row(&kind.to_string(), &value));
    }
    let hosts = service.stored_non_proxied_hosts();
    let bypass = if hosts.is_empty() {
        "none".to_string()
    } else {
        hosts.join(", ")
    };
    lines.push(row("bypass", &bypass));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Handle completion command.
fn handle_completion(completion_cli: CompletionCommand) -> Result<()> {
    let shell = completion_cli.shell.unwrap_or_else(detect_shell_from_env);
    generate_completions(shell);
    Ok(())
}

/// Detect the user's shell from `$SHELL`.
fn detect_shell_from_env() -> Shell {
    if let Ok(shell_path) = std::env::var("SHELL") {
        let shell_name = Path::new(&shell_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();

        match shell_name.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" | "pwsh" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => {
                print_warning(&format!(
                    "Unknown shell '{}' from $SHELL. Defaulting to bash.",
                    shell_name
                ));
                Shell::Bash
            }
        }
    } else if cfg!(windows) {
        Shell::PowerShell
    } else {
        Shell::Bash
    }
}

/// Generate shell completions to stdout.
fn generate_completions(shell: Shell) {
    /// Writer that silently ignores BrokenPipe errors.
    struct BrokenPipeIgnorer<W: Write> {
        inner: W,
    }

    impl<W: Write> Write for BrokenPipeIgnorer<W> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self.inner.write(buf) {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(buf.len()),
                other => other,
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            match self.inner.flush() {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        }
    }

    let mut cmd = Cli::command();
    let mut writer = BrokenPipeIgnorer {
        inner: io::stdout(),
    };
    generate(shell, &mut cmd, "easyproxy", &mut writer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use easyproxy_core::{CredentialPolicy, ProxyStore};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn output(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        run(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn build_cmd(address: &str) -> BuildCommand {
        BuildCommand {
            address: address.to_string(),
            reference: None,
            auth: false,
            user: None,
            password: None,
            bypass: None,
            default_bypass: false,
            strict: false,
            format: None,
        }
    }

    #[test]
    fn test_check_text_and_json() {
        let cmd = CheckCommand {
            address: "proxy.example.com:8080".to_string(),
            json: false,
        };
        assert_eq!(
            output(|out| run_check(&cmd, out)),
            "host: proxy.example.com\nport: 8080\n"
        );

        let cmd = CheckCommand { json: true, ..cmd };
        let json: serde_json::Value =
            serde_json::from_str(&output(|out| run_check(&cmd, out))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"host": "proxy.example.com", "port": 8080})
        );
    }

    #[test]
    fn test_check_rejects_malformed() {
        let cmd = CheckCommand {
            address: "a:b:c".to_string(),
            json: false,
        };
        let err = run_check(&cmd, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Malformed proxy address"));
    }

    #[test]
    fn test_bypass() {
        let cmd = BypassCommand {
            list: "127.0.0.1, localhost ,, foo.bar".to_string(),
            with_defaults: false,
            json: false,
        };
        assert_eq!(
            output(|out| run_bypass(&cmd, out)),
            "127.0.0.1\nlocalhost\nfoo.bar\n"
        );

        let cmd = BypassCommand {
            list: "foo.bar".to_string(),
            with_defaults: true,
            json: true,
        };
        let hosts: Vec<String> =
            serde_json::from_str(&output(|out| run_bypass(&cmd, out))).unwrap();
        assert_eq!(hosts, vec!["127.0.0.1", "localhost", "foo.bar"]);
    }

    #[test]
    fn test_build_json() {
        let cmd = BuildCommand {
            auth: true,
            user: Some("alice".to_string()),
            password: Some("pw".to_string()),
            bypass: Some("a, b".to_string()),
            ..build_cmd("proxy:3128")
        };
        let text = output(|out| run_build(&cmd, &CliConfig::default(), out));
        let config: ProxyConfig = serde_json::from_str(&text).unwrap();

        assert_eq!(config.address_text(), "proxy:3128");
        assert_eq!(config.user(), Some("alice"));
        assert_eq!(config.non_proxy_hosts(), ["a", "b"]);
    }

    #[test]
    fn test_build_toml_from_settings() {
        let settings = CliConfig {
            output_format: OutputFormat::Toml,
            seed_default_non_proxy_hosts: true,
            ..Default::default()
        };
        let text = output(|out| run_build(&build_cmd("proxy:3128"), &settings, out));
        let config: ProxyConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.non_proxy_hosts(), ["127.0.0.1", "localhost"]);
    }

    #[test]
    fn test_build_errors() {
        let err = run_build(&build_cmd("proxy"), &CliConfig::default(), &mut Vec::new())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid --address"));

        let settings = CliConfig {
            credential_policy: CredentialPolicy::Strict,
            ..Default::default()
        };
        let cmd = BuildCommand {
            auth: true,
            user: Some("alice".to_string()),
            ..build_cmd("proxy:80")
        };
        let err = run_build(&cmd, &settings, &mut Vec::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("user or password is empty"));
    }

    #[test]
    fn test_edit_commits_and_previews() {
        let cmd = EditCommand {
            from: None,
            default_bypass: false,
            strict: false,
            format: None,
        };
        let script = "office\nproxy:3128\ny\nalice\npw\nintranet\ny\n";
        let mut prompts = Vec::new();
        let text = output(|out| {
            run_edit(
                &cmd,
                &CliConfig::default(),
                Cursor::new(script),
                &mut prompts,
                out,
            )
        });

        let config: ProxyConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(config.reference(), Some("office"));
        assert_eq!(config.address_text(), "proxy:3128");

        let prompts = String::from_utf8(prompts).unwrap();
        assert!(prompts.contains("Platform proxy settings after apply:"));
        assert!(prompts.contains("HTTPS           proxy:3128 (user alice)"));
        assert!(prompts.contains("SOCKS           unset"));
    }

    #[test]
    fn test_edit_prefills_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proxy.toml");
        let content = "host = \"lab\"\nport = 8000\nnon_proxy_hosts = [\"lab.local\"]\n";
        std::fs::write(&path, content).unwrap();
        let cmd = EditCommand {
            from: Some(path),
            default_bypass: false,
            strict: false,
            format: Some(OutputFormat::Toml),
        };
        let mut prompts = Vec::new();
        let text = output(|out| {
            run_edit(
                &cmd,
                &CliConfig::default(),
                Cursor::new("\n\n\n\n\n"),
                &mut prompts,
                out,
            )
        });

        let config: ProxyConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.address_text(), "lab:8000");
        assert_eq!(config.non_proxy_hosts(), ["lab.local"]);
    }

    #[test]
    fn test_edit_cancelled_prints_nothing() {
        let cmd = EditCommand {
            from: None,
            default_bypass: false,
            strict: false,
            format: None,
        };
        let text = output(|out| {
            run_edit(
                &cmd,
                &CliConfig::default(),
                Cursor::new(""),
                Vec::new(),
                out,
            )
        });
        assert_eq!(text, "");
    }

    #[test]
    fn test_load_proxy_file_json_and_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proxy.json");
        std::fs::write(&path, r#"{"host": "p", "port": 1}"#).unwrap();
        assert_eq!(load_proxy_file(&path).unwrap().address_text(), "p:1");

        std::fs::write(&path, r#"{"host": "p", "port": 0}"#).unwrap();
        let err = load_proxy_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid proxy port"));

        assert!(load_proxy_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_render_preview_defaults() {
        let preview = render_preview(&MemoryProxyService::new());
        assert!(preview.contains("system proxies  enabled"));
        assert!(preview.contains("manual proxies  disabled"));
        assert!(preview.contains("HTTP            unset"));
        assert!(preview.contains("bypass          none"));
    }

    #[test]
    fn test_render_preview_after_apply() {
        let mut store = ServiceProxyStore::new(MemoryProxyService::new());
        let config = ProxyConfig::builder()
            .host("proxy")
            .port(8080)
            .non_proxy_hosts_raw("a,b")
            .build()
            .unwrap();
        store.apply(&config).unwrap();

        let preview = render_preview(store.service());
        assert!(preview.contains("system proxies  disabled"));
        assert!(preview.contains("manual proxies  enabled"));
        assert!(preview.contains("HTTP            proxy:8080\n"));
        assert!(preview.contains("bypass          a, b"));
    }

    #[test]
    fn test_run_config() {
        let dir = TempDir::new().unwrap();
        let loaded = LoadedConfig {
            config: CliConfig::default(),
            path: Some(dir.path().join("config.toml")),
        };

        let cmd = ConfigCommand { json: true };
        let text = output(|out| run_config(&cmd, &loaded, out));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["exists"], serde_json::json!(false));
        assert_eq!(json["settings"]["credential_policy"], "lenient");
        assert_eq!(json["settings"]["output_format"], "json");

        let cmd = ConfigCommand { json: false };
        let text = output(|out| run_config(&cmd, &loaded, out));
        assert!(text.starts_with("# "));
        assert!(text.contains("credential_policy = \"lenient\""));
    }
}
