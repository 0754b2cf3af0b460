//! Line-oriented terminal front end for an edit session.
//!
//! Each field is asked for in turn with its current value in brackets. An
//! empty answer keeps the current value and `-` clears it. After every answer
//! the session re-validates and any problem is shown right away. End of input
//! cancels the session.

use std::io::{BufRead, Write};

use easyproxy_core::{EasyProxyError, EditSession, SessionDriver, SessionError, SessionState};

/// Answer that clears an optional field.
const CLEAR: &str = "-";

/// [`SessionDriver`] reading answers from `input` and writing prompts to `output`.
pub struct PromptDriver<R, W> {
    input: R,
    output: W,
}

/// What to do once all fields were asked for.
enum Decision {
    Save,
    Cancel,
    EditAgain,
}

impl<R: BufRead, W: Write> PromptDriver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask one question. `None` means end of input.
    fn ask(&mut self, label: &str, current: &str) -> Result<Option<String>, EasyProxyError> {
        let answer = self.ask_verbatim(label, current)?;
        Ok(answer.map(|answer| answer.trim().to_string()))
    }

    /// Like [`ask`](Self::ask), but only the line terminator is removed.
    fn ask_verbatim(
        &mut self,
        label: &str,
        current: &str,
    ) -> Result<Option<String>, EasyProxyError> {
        if current.is_empty() {
            write!(self.output, "{}: ", label).map_err(io_error)?;
        } else {
            write!(self.output, "{} [{}]: ", label, current).map_err(io_error)?;
        }
        self.output.flush().map_err(io_error)?;

        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(io_error)? == 0 {
            writeln!(self.output).map_err(io_error)?;
            return Ok(None);
        }
        let answer = line.strip_suffix('\n').unwrap_or(&line);
        let answer = answer.strip_suffix('\r').unwrap_or(answer);
        Ok(Some(answer.to_string()))
    }

    fn ask_yes_no(&mut self, label: &str, current: bool) -> Result<Option<bool>, EasyProxyError> {
        loop {
            let shown = if current { "y" } else { "n" };
            let Some(answer) = self.ask(&format!("{} (y/n)", label), shown)? else {
                return Ok(None);
            };
            match answer.to_lowercase().as_str() {
                "" => return Ok(Some(current)),
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "  Please answer y or n.").map_err(io_error)?,
            }
        }
    }

    fn report(&mut self, session: &EditSession) -> Result<(), EasyProxyError> {
        if let Some(err) = session.validation_error() {
            writeln!(self.output, "  ! {}", err).map_err(io_error)?;
        }
        Ok(())
    }

    /// Ask for every field once. Returns `false` on end of input.
    fn ask_fields(&mut self, session: &mut EditSession) -> Result<bool, EasyProxyError> {
        let current = session.fields().reference.clone().unwrap_or_default();
        let Some(answer) = self.ask("Reference", &current)? else {
            return Ok(false);
        };
        if !answer.is_empty() {
            let reference = (answer != CLEAR).then_some(answer);
            session.set_reference(reference)?;
        }

        loop {
            let current = session.fields().address.clone();
            let Some(answer) = self.ask("Proxy address (host:port)", &current)? else {
                return Ok(false);
            };
            let address = if answer.is_empty() { current } else { answer };
            session.set_address(address)?;
            match session.validation_error() {
                Some(EasyProxyError::Parse(err)) => {
                    writeln!(self.output, "  ! {}", err).map_err(io_error)?
                }
                _ => break,
            }
        }

        let current = session.fields().authentication_required;
        let Some(required) = self.ask_yes_no("Requires authentication", current)? else {
            return Ok(false);
        };
        session.set_authentication_required(required)?;

        if required {
            let current = session.fields().user.clone();
            let Some(answer) = self.ask("User", &current)? else {
                return Ok(false);
            };
            match answer.as_str() {
                "" => {}
                CLEAR => {
                    session.set_user("")?;
                }
                _ => {
                    session.set_user(answer)?;
                }
            }

            let masked = if session.fields().password.is_empty() {
                ""
            } else {
                "****"
            };
            let Some(answer) = self.ask_verbatim("Password", masked)? else {
                return Ok(false);
            };
            match answer.as_str() {
                "" => {}
                CLEAR => {
                    session.set_password("")?;
                }
                _ => {
                    session.set_password(answer)?;
                }
            }
        }

        let current = session.fields().non_proxy_hosts.clone();
        let Some(answer) = self.ask("Bypass hosts (comma-separated)", &current)? else {
            return Ok(false);
        };
        match answer.as_str() {
            "" => {}
            CLEAR => {
                session.set_non_proxy_hosts("")?;
            }
            _ => {
                session.set_non_proxy_hosts(answer)?;
            }
        }

        self.report(session)?;
        Ok(true)
    }

    fn decide(&mut self, session: &EditSession) -> Result<Option<Decision>, EasyProxyError> {
        if let Some(config) = session.preview() {
            writeln!(self.output, "\n  {}", config).map_err(io_error)?;
        }
        loop {
            let Some(answer) = self.ask("Save? [y]es / [n]o, cancel / [e]dit again", "y")? else {
                return Ok(None);
            };
            let decision = match answer.to_lowercase().as_str() {
                "" | "y" | "yes" => Decision::Save,
                "n" | "no" | "c" | "cancel" => Decision::Cancel,
                "e" | "edit" => Decision::EditAgain,
                _ => {
                    writeln!(self.output, "  Please answer y, n or e.").map_err(io_error)?;
                    continue;
                }
            };
            return Ok(Some(decision));
        }
    }
}

impl<R: BufRead, W: Write> SessionDriver for PromptDriver<R, W> {
    fn drive(&mut self, session: &mut EditSession) -> easyproxy_core::Result<()> {
        loop {
            if !self.ask_fields(session)? {
                session.cancel()?;
                return Ok(());
            }

            match self.decide(session)? {
                None | Some(Decision::Cancel) => {
                    session.cancel()?;
                    writeln!(self.output, "Cancelled.").map_err(io_error)?;
                    return Ok(());
                }
                Some(Decision::EditAgain) => continue,
                Some(Decision::Save) => match session.commit() {
                    Ok(_) => return Ok(()),
                    Err(SessionError::NotCommittable(SessionState::Invalid)) => {
                        let hint = "  Cannot save until the problems above are fixed.";
                        writeln!(self.output, "{}", hint).map_err(io_error)?;
                        self.report(session)?;
                    }
                    Err(err) => return Err(err.into()),
                },
            }
        }
    }
}

fn io_error(err: std::io::Error) -> EasyProxyError {
    EasyProxyError::Driver(format!("terminal I/O failed: {}", err))
}
