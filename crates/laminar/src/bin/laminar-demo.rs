//! Laminar demo - serves a small stack built from the built-in stages.

use std::path::PathBuf;

use anyhow::Context as _;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};

use laminar::config::ConfigLoader;
use laminar::middleware::stages::{
    LoggerMiddleware, RecoveryMiddleware, RequestId, RequestIdMiddleware,
};
use laminar::middleware::{Context, Request, ResponseSink, Stack};
use laminar::server::Server;

/// Command-line arguments.
struct Args {
    /// Path to a configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("laminar-demo {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Laminar demo server

USAGE:
    laminar-demo [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON, default: laminar.toml if present)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES (also read from .env):
    LAMINAR__SERVER__HTTP_ADDR        Bind address (default: 0.0.0.0:3000)
    LAMINAR__SERVER__REQUEST_TIMEOUT_MS
    LAMINAR__LOGGING__LEVEL           Log filter (default: info)
    LAMINAR__LOGGING__FORMAT          json, pretty or compact
    RUST_LOG                          Overrides the log filter

ROUTES:
    GET /          greeting with the request ID
    GET /hello     plain greeting
    POST /echo     echoes the request body
"
    );
}

fn load_config(args: &Args) -> anyhow::Result<laminar::config::LaminarConfig> {
    let loader = ConfigLoader::new().with_dotenv()?;
    let loader = match &args.config {
        Some(path) => loader
            .with_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => loader.with_optional_file("laminar.toml")?,
    };

    Ok(loader.with_env_prefix("LAMINAR").load()?)
}

fn demo_stack() -> Stack {
    let mut stack = Stack::new();
    stack
        .register(RecoveryMiddleware::new())
        .register(RequestIdMiddleware::trust_incoming())
        .register(LoggerMiddleware::new())
        .register_fn("content_type", |ctx, writer, request, next| {
            writer.before(|headers, _status| {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("text/plain; charset=utf-8"));
            });
            next.run(ctx, writer, request);
        })
        .register_fn("routes", |ctx, writer, request, next| {
            match (request.method().as_str(), request.uri().path()) {
                ("GET", "/" | "/hello") | ("POST", "/echo") => next.run(ctx, writer, request),
                _ => {
                    writer.write_header(StatusCode::NOT_FOUND);
                    if let Err(error) = writer.write(b"not found\n") {
                        tracing::debug!(%error, "failed to write not-found body");
                    }
                }
            }
        })
        .register_context_handler_fn(
            |ctx: &Context, sink: &mut dyn ResponseSink, request: &mut Request| {
                let reply = match request.uri().path() {
                    "/" => match ctx.value::<RequestId>() {
                        Some(id) => format!("hello from request {id}\n"),
                        None => "hello\n".to_string(),
                    },
                    "/hello" => "hello, world\n".to_string(),
                    _ => String::from_utf8_lossy(request.body()).into_owned(),
                };
                if let Err(error) = sink.write(reply.as_bytes()) {
                    tracing::debug!(%error, "failed to write reply");
                }
            },
        );
    stack
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    laminar::telemetry::init_logging(&config.logging.to_log_config())?;

    let stack = demo_stack();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        middleware = ?stack.middleware_names(),
        "starting laminar demo"
    );

    Server::new(stack, laminar::server_config(&config.server))
        .run()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use laminar::middleware::ResponseBuffer;
    use std::io;

    /// A sink whose peer has gone away.
    #[derive(Default)]
    struct ClosedSink {
        headers: HeaderMap,
        status: Option<StatusCode>,
    }

    impl ResponseSink for ClosedSink {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, status: StatusCode) {
            self.status.get_or_insert(status);
        }

        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn request(method: &str, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Default::default())
            .unwrap()
    }

    #[test]
    fn test_demo_routes() {
        let stack = demo_stack();

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request("GET", "/hello"));
        assert_eq!(buffer.status(), Some(StatusCode::OK));
        assert_eq!(buffer.body(), b"hello, world\n");

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request("GET", "/missing"));
        assert_eq!(buffer.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(buffer.body(), b"not found\n");
    }

    #[test]
    fn test_failed_writes_do_not_abort_serving() {
        let stack = demo_stack();

        let mut sink = ClosedSink::default();
        stack.serve(&mut sink, &mut request("GET", "/missing"));
        assert_eq!(sink.status, Some(StatusCode::NOT_FOUND));

        let mut sink = ClosedSink::default();
        stack.serve(&mut sink, &mut request("POST", "/echo"));
        assert_eq!(sink.status, Some(StatusCode::OK));
    }
}
