//! HTTP network backend

use crate::config::schema::NetworkConfig;
use crate::error::{ShelterError, ShelterResult};
use crate::http::{Headers, Method, Request, Response};
use crate::network::{resolve_url, Network};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, RequestBuilder};

/// Fetches over HTTP(S) with a shared `ureq` agent
pub struct HttpNetwork {
    agent: Agent,
    origin: String,
    user_agent: String,
}

impl HttpNetwork {
    pub fn new(config: &NetworkConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build()
            .into();

        Self {
            agent,
            origin: config.origin.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn call(agent: &Agent, request: &Request, url: &str, user_agent: &str) -> ShelterResult<Response> {
        let result = match request.method {
            Method::Get => with_headers(agent.get(url), request, user_agent).call(),
            Method::Head => with_headers(agent.head(url), request, user_agent).call(),
            Method::Delete => with_headers(agent.delete(url), request, user_agent).call(),
            Method::Options => with_headers(agent.options(url), request, user_agent).call(),
            Method::Post => {
                with_headers(agent.post(url), request, user_agent).send(request.body.as_slice())
            }
            Method::Put => {
                with_headers(agent.put(url), request, user_agent).send(request.body.as_slice())
            }
            Method::Patch => {
                with_headers(agent.patch(url), request, user_agent).send(request.body.as_slice())
            }
        };

        let mut response = result.map_err(|e| ShelterError::network(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();
        let body = if request.method == Method::Head {
            Vec::new()
        } else {
            response
                .body_mut()
                .read_to_vec()
                .map_err(|e| ShelterError::network(url, format!("reading body: {}", e)))?
        };

        Ok(Response {
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: RequestBuilder<B>,
    request: &Request,
    user_agent: &str,
) -> RequestBuilder<B> {
    builder = builder.header("user-agent", user_agent);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> ShelterResult<Response> {
        let url = resolve_url(&self.origin, &request.url);
        debug!("{} {}", request.method, url);

        let agent = self.agent.clone();
        let request = request.clone();
        let user_agent = self.user_agent.clone();

        tokio::task::spawn_blocking(move || Self::call(&agent, &request, &url, &user_agent))
            .await
            .map_err(|e| ShelterError::Internal(format!("fetch task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
