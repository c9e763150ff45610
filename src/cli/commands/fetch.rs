//! Fetch command - route one request through the worker
//!
//! The response body goes to stdout untouched; status and the response
//! source go to stderr so the body can be piped.

use crate::cli::args::FetchArgs;
use crate::cli::open_host;
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::http::{Method, Request, Response};
use crate::worker::{FetchReport, ResponseSource};
use console::style;
use std::io::{self, Write};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShelterResult<()> {
    let request = build_request(&args, &config.network.origin)?;
    let mut host = open_host(config, args.offline).await?;

    let report = host.fetch(request).await?;
    print_source(&report);
    write_response(&report.response, args.include_headers)
}

/// Turn CLI arguments into a request keyed the way the manifest is
fn build_request(args: &FetchArgs, origin: &str) -> ShelterResult<Request> {
    let method: Method = args.method.parse().map_err(ShelterError::User)?;
    let url = strip_origin(&args.url, origin);

    let mut request = if args.navigate {
        Request::navigate(url)
    } else {
        Request::get(url)
    };
    request = request.with_method(method);
    if let Some(ref accept) = args.accept {
        request = request.with_header("accept", accept.as_str());
    }
    if let Some(ref data) = args.data {
        request = request.with_body(data.as_bytes());
    }
    Ok(request)
}

/// Same-origin absolute URLs become paths so they match cached entries
fn strip_origin(url: &str, origin: &str) -> String {
    let origin = origin.trim_end_matches('/');
    match url.strip_prefix(origin) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with(['/', '?', '#']) => {
            if rest.starts_with('/') {
                rest.to_string()
            } else {
                format!("/{}", rest)
            }
        }
        _ => url.to_string(),
    }
}

fn print_source(report: &FetchReport) {
    let source = match report.source {
        ResponseSource::Network => style(report.source.to_string()).cyan(),
        ResponseSource::Cache => style(report.source.to_string()).green(),
        ResponseSource::OfflineFallback => style(report.source.to_string()).yellow(),
    };
    eprintln!(
        "{} {} via {}",
        style(report.response.status).bold(),
        report.response.url,
        source
    );
}

fn write_response(response: &Response, include_headers: bool) -> ShelterResult<()> {
    let mut stdout = io::stdout().lock();
    if include_headers {
        writeln!(stdout, "HTTP {}", response.status)
            .map_err(|e| ShelterError::io("writing response", e))?;
        for (name, value) in response.headers.iter() {
            writeln!(stdout, "{}: {}", name, value)
                .map_err(|e| ShelterError::io("writing response", e))?;
        }
        writeln!(stdout).map_err(|e| ShelterError::io("writing response", e))?;
    }
    stdout
        .write_all(&response.body)
        .and_then(|_| stdout.flush())
        .map_err(|e| ShelterError::io("writing response", e))
}
