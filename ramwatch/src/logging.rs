//! Tracing setup
//!
//! Diagnostics go to stderr so stdout carries only status lines.
//! `RUST_LOG` overrides the verbosity flag; `LOG_FORMAT=json` switches to
//! structured JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a `-v` count: 0 info, 1 debug, 2+ trace
pub fn directive_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "ramwatch=info",
        1 => "ramwatch=debug",
        _ => "ramwatch=trace",
    }
}

/// Initialize the global subscriber
pub fn init_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) if !value.is_empty() => EnvFilter::try_new(value)?,
        _ => EnvFilter::new("warn").add_directive(directive_for(verbosity).parse()?),
    };

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        for v in 0..4 {
            let directive: tracing_subscriber::filter::Directive = directive_for(v).parse().unwrap();
            assert!(directive.to_string().starts_with("ramwatch="));
        }
    }
}
