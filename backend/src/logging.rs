use tracing::{Event, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "warn,merge2048_backend=info,merge2048_shared=info";

/// Collects the message plus any structured fields as `key=value` pairs.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message.push_str(&format!("{:?}", value));
        } else if !field.name().starts_with("log.") {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else if !field.name().starts_with("log.") {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

impl MessageVisitor {
    fn line(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

struct CustomLayer;

impl<S: Subscriber> Layer<S> for CustomLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if visitor.message.is_empty() {
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = visitor.line();

        match *metadata.level() {
            tracing::Level::ERROR => {
                eprintln!("[{}] ❌ Error: {} - {}", timestamp, metadata.target(), line)
            }
            tracing::Level::WARN => {
                eprintln!("[{}] ⚠️ Warning: {} - {}", timestamp, metadata.target(), line)
            }
            tracing::Level::INFO => println!("[{}] ℹ️ {} - {}", timestamp, metadata.target(), line),
            tracing::Level::DEBUG => println!("[{}] 🔄 {} - {}", timestamp, metadata.target(), line),
            _ => println!("[{}] {} - {}", timestamp, metadata.target(), line),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
/// Records from the `log` facade (the rules crate) are bridged in as well.
pub fn setup() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = Registry::default().with(env_filter).with(CustomLayer);

    if subscriber.try_init().is_err() {
        eprintln!("Logging was already initialised, keeping the existing subscriber");
    }
}
