// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolver over a Vault-style KV v2 secret engine.

use std::time::Duration;

use async_trait::async_trait;
use foundry_common_secret::SecretString;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::RemoteKvConfig;
use crate::context::ResolutionContext;
use crate::error::{ConfigError, ResolveError};
use crate::reference::SecretReference;
use crate::resolver::Resolver;

/// KV v2 read envelope: `{ "data": { "data": { ... }, "metadata": { ... } } }`.
#[derive(Debug, Deserialize)]
struct KvReadResponse {
	data: Option<KvVersion>,
}

#[derive(Debug, Deserialize)]
struct KvVersion {
	/// Null when the latest version has been deleted.
	data: Option<serde_json::Map<String, Value>>,
}

pub struct RemoteKvResolver {
	http_client: reqwest::Client,
	address: String,
	mount: String,
	path_template: String,
	token_header: String,
	token: SecretString,
}

impl RemoteKvResolver {
	/// Build a resolver for `config`, authenticating with `token`.
	///
	/// Plain `http://` addresses are refused unless `allow_insecure` is set.
	pub fn new(config: &RemoteKvConfig, token: SecretString) -> Result<Self, ConfigError> {
		config.validate()?;

		let http_client = reqwest::Client::builder()
			.user_agent(concat!("foundry/", env!("CARGO_PKG_VERSION")))
			.timeout(Duration::from_secs(config.timeout_secs))
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(|e| {
				ConfigError::invalid_value(
					"remote_kv",
					format!("failed to create HTTP client: {e}"),
				)
			})?;

		Ok(Self {
			http_client,
			address: config.address.trim_end_matches('/').to_string(),
			mount: config.mount.trim_matches('/').to_string(),
			path_template: config.path_template.clone(),
			token_header: config.token_header.clone(),
			token,
		})
	}

	fn secret_url(&self, encoded_path: &str) -> String {
		let path = self
			.path_template
			.replace("{mount}", &self.mount)
			.replace("{path}", encoded_path);
		if path.starts_with('/') {
			format!("{}{}", self.address, path)
		} else {
			format!("{}/{}", self.address, path)
		}
	}
}

#[async_trait]
impl Resolver for RemoteKvResolver {
	fn name(&self) -> &str {
		"remote-kv"
	}

	#[instrument(skip(self, ctx, reference), fields(full_key = %ctx.full_key(reference)))]
	async fn resolve(
		&self,
		ctx: &ResolutionContext,
		reference: &SecretReference,
	) -> Result<SecretString, ResolveError> {
		let path = ctx.namespaced_path(reference);
		let location = format!("{}/{}", self.mount, path);
		let url = self.secret_url(&encode_secret_path(&path)?);

		debug!(url = %url, "reading secret from KV store");

		let response = self
			.http_client
			.get(&url)
			.header(self.token_header.as_str(), self.token.expose().as_str())
			.send()
			.await
			.map_err(|e| {
				warn!(error = %e, "KV store request failed");
				ResolveError::unavailable(format!(
					"request to secret store failed for {location}: {e}"
				))
			})?;

		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(ResolveError::not_found(format!(
				"secret {location} not found in remote store"
			)));
		}
		if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
			return Err(ResolveError::unavailable(format!(
				"access denied reading {location} (HTTP {status}); the auth token may be expired"
			)));
		}
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(ResolveError::unavailable(format!(
				"HTTP {status} reading {location}: {}",
				sanitize_body_for_error(&body, 200)
			)));
		}

		let body: KvReadResponse = response.json().await.map_err(|e| {
			ResolveError::unavailable(format!("invalid response for {location}: {e}"))
		})?;

		let Some(fields) = body.data.and_then(|version| version.data) else {
			return Err(ResolveError::not_found(format!(
				"secret {location} has no current version"
			)));
		};

		match fields.get(reference.key()) {
			Some(Value::String(value)) => Ok(SecretString::new(value.clone())),
			Some(other) => Err(ResolveError::unavailable(format!(
				"key '{}' in secret {location} is a {}, expected a string",
				reference.key(),
				json_type_name(other)
			))),
			None => Err(ResolveError::not_found(format!(
				"key '{}' not found in secret {location}",
				reference.key()
			))),
		}
	}
}

impl std::fmt::Debug for RemoteKvResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteKvResolver")
			.field("address", &self.address)
			.field("mount", &self.mount)
			.field("path_template", &self.path_template)
			.field("token_header", &self.token_header)
			.finish_non_exhaustive()
	}
}

/// Percent-encode each `/`-separated segment so the instance name cannot
/// add query, fragment or dot segments to the request URL.
fn encode_secret_path(path: &str) -> Result<String, ResolveError> {
	let mut encoded = Vec::new();
	for segment in path.split('/') {
		if segment.is_empty() || segment == "." || segment == ".." {
			return Err(ResolveError::unavailable(format!(
				"'{path}' cannot be used as a KV path: empty or relative segment"
			)));
		}
		encoded.push(urlencoding::encode(segment));
	}
	Ok(encoded.join("/"))
}

fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

fn sanitize_body_for_error(body: &str, max_len: usize) -> String {
	let sanitized: String = body
		.chars()
		.filter(|c| !c.is_control() || *c == ' ')
		.take(max_len)
		.collect();
	if body.chars().count() > max_len {
		format!("{sanitized}...")
	} else {
		sanitized
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn config(address: &str) -> RemoteKvConfig {
		RemoteKvConfig {
			address: address.to_string(),
			allow_insecure: true,
			..RemoteKvConfig::default()
		}
	}

	async fn resolve(server: &MockServer, key: &str) -> Result<SecretString, ResolveError> {
		let resolver =
			RemoteKvResolver::new(&config(&server.uri()), "hvs.test-token".into()).unwrap();
		resolver
			.resolve(
				&ResolutionContext::new("myapp-prod"),
				&SecretReference::new("database/prod", key).unwrap(),
			)
			.await
	}

	async fn mount_secret(server: &MockServer, body: Value) {
		Mock::given(method("GET"))
			.and(path("/v1/secret/data/myapp-prod/database/prod"))
			.and(header("X-Vault-Token", "hvs.test-token"))
			.respond_with(ResponseTemplate::new(200).set_body_json(body))
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn reads_string_value_from_namespaced_path() {
		let server = MockServer::start().await;
		mount_secret(
			&server,
			json!({
				"data": {
					"data": {"password": "s3cr3t", "user": "app"},
					"metadata": {"version": 3}
				}
			}),
		)
		.await;

		assert_eq!(resolve(&server, "password").await.unwrap().expose(), "s3cr3t");
	}

	#[tokio::test]
	async fn missing_key_is_not_found_with_path() {
		let server = MockServer::start().await;
		mount_secret(&server, json!({"data": {"data": {"user": "app"}}})).await;

		let err = resolve(&server, "password").await.unwrap_err();
		assert!(err.is_not_found());
		assert!(err.to_string().contains("secret/myapp-prod/database/prod"));
	}

	#[tokio::test]
	async fn non_string_value_is_a_type_error() {
		let server = MockServer::start().await;
		mount_secret(&server, json!({"data": {"data": {"password": 1234}}})).await;

		let err = resolve(&server, "password").await.unwrap_err();
		assert!(matches!(err, ResolveError::Unavailable(_)));
		assert!(err.to_string().contains("is a number, expected a string"));
	}

	#[tokio::test]
	async fn deleted_version_is_not_found() {
		let server = MockServer::start().await;
		mount_secret(
			&server,
			json!({"data": {"data": null, "metadata": {"deletion_time": "x"}}}),
		)
		.await;

		assert!(resolve(&server, "password").await.unwrap_err().is_not_found());
	}

	#[tokio::test]
	async fn missing_secret_is_not_found() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
			.mount(&server)
			.await;

		let err = resolve(&server, "password").await.unwrap_err();
		assert!(err.is_not_found());
		assert_eq!(
			err.to_string(),
			"secret secret/myapp-prod/database/prod not found in remote store"
		);
	}

	#[tokio::test]
	async fn forbidden_is_unavailable_and_does_not_leak_token() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(
				ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
			)
			.mount(&server)
			.await;

		let err = resolve(&server, "password").await.unwrap_err();
		assert!(matches!(err, ResolveError::Unavailable(_)));
		assert!(!err.to_string().contains("hvs.test-token"));
	}

	#[tokio::test]
	async fn server_error_body_is_sanitized() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(500).set_body_string("boom\nstack\ttrace"))
			.mount(&server)
			.await;

		let err = resolve(&server, "password").await.unwrap_err();
		assert_eq!(
			err.to_string(),
			"HTTP 500 Internal Server Error reading secret/myapp-prod/database/prod: boomstacktrace"
		);
	}

	#[tokio::test]
	async fn unreachable_server_is_unavailable() {
		// Bind then release a port so nothing is listening on it.
		let port = std::net::TcpListener::bind("127.0.0.1:0")
			.unwrap()
			.local_addr()
			.unwrap()
			.port();

		let resolver =
			RemoteKvResolver::new(&config(&format!("http://127.0.0.1:{port}")), "t".into())
				.unwrap();
		let err = resolver
			.resolve(
				&ResolutionContext::new("myapp-prod"),
				&SecretReference::new("database/prod", "password").unwrap(),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, ResolveError::Unavailable(_)));
	}

	#[tokio::test]
	async fn custom_mount_template_and_header() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/kv/apps/myapp-prod/database/prod"))
			.and(header("Authorization", "t"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({"data": {"data": {"password": "p"}}})),
			)
			.mount(&server)
			.await;

		let config = RemoteKvConfig {
			address: format!("{}/", server.uri()),
			mount: "/apps/".to_string(),
			path_template: "kv/{mount}/{path}".to_string(),
			token_header: "Authorization".to_string(),
			allow_insecure: true,
			..RemoteKvConfig::default()
		};
		let resolver = RemoteKvResolver::new(&config, "t".into()).unwrap();
		let value = resolver
			.resolve(
				&ResolutionContext::new("myapp-prod"),
				&SecretReference::new("database/prod", "password").unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(value.expose(), "p");
	}

	#[tokio::test]
	async fn instance_cannot_escape_its_path() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/secret/data/a%23/database/prod"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({"data": {"data": {"password": "mine"}}})),
			)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/v1/secret/data/a"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({"data": {"data": {"password": "other"}}})),
			)
			.expect(0)
			.mount(&server)
			.await;

		let resolver = RemoteKvResolver::new(&config(&server.uri()), "t".into()).unwrap();
		let reference = SecretReference::new("database/prod", "password").unwrap();

		let value = resolver
			.resolve(&ResolutionContext::new("a#"), &reference)
			.await
			.unwrap();
		assert_eq!(value.expose(), "mine");

		for instance in ["a/x/../../a?", "a/./b", "a//b"] {
			let err = resolver
				.resolve(&ResolutionContext::new(instance), &reference)
				.await
				.unwrap_err();
			assert!(matches!(err, ResolveError::Unavailable(_)), "{instance}: {err}");
		}
	}

	#[test]
	fn path_segments_are_percent_encoded() {
		assert_eq!(
			encode_secret_path("my app?/database/prod").unwrap(),
			"my%20app%3F/database/prod"
		);
		assert!(encode_secret_path("../database").is_err());
	}

	#[test]
	fn rejects_plain_http_without_allow_insecure() {
		let config = RemoteKvConfig {
			address: "http://vault.internal:8200".to_string(),
			..RemoteKvConfig::default()
		};
		assert!(RemoteKvResolver::new(&config, "t".into()).is_err());
	}

	#[test]
	fn debug_does_not_leak_token() {
		let resolver =
			RemoteKvResolver::new(&config("http://127.0.0.1:8200"), "hvs.very-secret".into())
				.unwrap();
		let debug = format!("{resolver:?}");
		assert!(!debug.contains("hvs.very-secret"));
		assert!(debug.contains("127.0.0.1:8200"));
	}
}
