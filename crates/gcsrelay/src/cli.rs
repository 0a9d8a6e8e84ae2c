//! Command-line surface of the relay.

use std::time::Duration;

use bytes::Bytes;
use clap::Parser;

use gcsrelay_fetch::{AuthKind, AuthSpec, FetchError, Method, TransferRequest};
use gcsrelay_store::{PredefinedAcl, StorageClass};

use crate::kv::parse_key_values;
use crate::pipeline::TransferPlan;

#[derive(Debug, Parser)]
#[command(
    name = "gcsrelay",
    version,
    about = "Relay an HTTP(S) URL into a Google Cloud Storage object",
    long_about = None
)]
pub struct App {
    /// Source URL to fetch.
    #[arg(long)]
    pub url: String,

    /// Destination bucket.
    #[arg(long = "gcs-bucket")]
    pub gcs_bucket: String,

    /// Destination object key.
    #[arg(long = "gcs-object")]
    pub gcs_object: String,

    /// HTTP method for the fetch.
    #[arg(long, default_value = "GET")]
    pub method: Method,

    /// Request headers, `k=v; k=v` or a JSON object.
    #[arg(long)]
    pub headers: Option<String>,

    /// Request body to send with the fetch.
    #[arg(long = "post-data")]
    pub post_data: Option<String>,

    /// Whole-request timeout in milliseconds.
    #[arg(long, default_value_t = 900_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Retry transient fetch failures, up to 3 attempts total.
    #[arg(long = "enable-retry")]
    pub enable_retry: bool,

    /// Authentication scheme for the fetch: none, basic or bearer.
    #[arg(long = "auth-type", default_value = "none")]
    pub auth_type: AuthKind,

    /// Username for basic auth.
    #[arg(long = "auth-username")]
    pub auth_username: Option<String>,

    /// Password for basic auth.
    #[arg(long = "auth-password")]
    pub auth_password: Option<String>,

    /// Token for bearer auth.
    #[arg(long = "auth-token")]
    pub auth_token: Option<String>,

    /// Content type stored on the object; the response header is used when
    /// unset.
    #[arg(long = "content-type")]
    pub content_type: Option<String>,

    /// Cache-Control stored on the object.
    #[arg(long = "cache-control")]
    pub cache_control: Option<String>,

    /// Object metadata, `k=v; k=v` or a JSON object.
    #[arg(long)]
    pub metadata: Option<String>,

    /// Storage tier for the object.
    #[arg(long = "storage-class", default_value = "STANDARD")]
    pub storage_class: StorageClass,

    /// Predefined ACL applied at write time.
    #[arg(long = "predefined-acl")]
    pub predefined_acl: Option<PredefinedAcl>,

    /// Skip the transfer entirely when the object already exists.
    #[arg(long = "if-not-exists")]
    pub if_not_exists: bool,
}

impl App {
    /// Turn parsed arguments into a transfer plan.
    ///
    /// Auth assembly is the one conversion that can still fail here: the
    /// enumerated options were already validated by their parsers.
    pub fn into_plan(self) -> Result<TransferPlan, FetchError> {
        let auth = AuthSpec::from_parts(
            self.auth_type,
            self.auth_username,
            self.auth_password,
            self.auth_token,
        )?;

        let mut request = TransferRequest::new(self.url)
            .method(self.method)
            .timeout(Duration::from_millis(self.timeout))
            .retry_enabled(self.enable_retry)
            .auth(auth);
        if let Some(headers) = parse_key_values("headers", self.headers.as_deref()) {
            request = request.headers(headers.into_iter().collect());
        }
        if let Some(body) = self.post_data {
            request = request.body(Bytes::from(body));
        }

        Ok(TransferPlan {
            request,
            bucket: self.gcs_bucket,
            object: self.gcs_object,
            content_type: self.content_type,
            cache_control: self.cache_control,
            metadata: parse_key_values("metadata", self.metadata.as_deref()),
            storage_class: self.storage_class,
            predefined_acl: self.predefined_acl,
            skip_if_exists: self.if_not_exists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<App, clap::Error> {
        let mut argv = vec![
            "gcsrelay",
            "--url",
            "https://example.com/data.bin",
            "--gcs-bucket",
            "bucket",
            "--gcs-object",
            "object",
        ];
        argv.extend_from_slice(args);
        App::try_parse_from(argv)
    }

    #[test]
    fn minimal_invocation_uses_documented_defaults() {
        let plan = parse(&[]).unwrap().into_plan().unwrap();
        assert_eq!(plan.request.method, Method::Get);
        assert_eq!(plan.request.timeout, Duration::from_millis(900_000));
        assert!(!plan.request.retry_enabled);
        assert_eq!(plan.request.auth, AuthSpec::None);
        assert_eq!(plan.storage_class, StorageClass::Standard);
        assert_eq!(plan.predefined_acl, None);
        assert!(!plan.skip_if_exists);
    }

    #[test]
    fn invalid_storage_class_is_rejected_at_parse_time() {
        assert!(parse(&["--storage-class", "FOO"]).is_err());
    }

    #[test]
    fn invalid_method_is_rejected_at_parse_time() {
        assert!(parse(&["--method", "TRACE"]).is_err());
    }

    #[test]
    fn invalid_predefined_acl_is_rejected_at_parse_time() {
        assert!(parse(&["--predefined-acl", "worldWritable"]).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected_at_parse_time() {
        assert!(parse(&["--timeout", "0"]).is_err());
    }

    #[test]
    fn basic_auth_without_password_fails_plan_assembly() {
        let app = parse(&["--auth-type", "basic", "--auth-username", "user"]).unwrap();
        let err = app.into_plan().unwrap_err();
        assert!(matches!(err, FetchError::AuthConfig { .. }));
    }

    #[test]
    fn full_invocation_maps_every_option() {
        let app = parse(&[
            "--method",
            "post",
            "--headers",
            "Accept=application/json; X-Trace=abc",
            "--post-data",
            "payload",
            "--timeout",
            "5000",
            "--enable-retry",
            "--auth-type",
            "bearer",
            "--auth-token",
            "tok",
            "--content-type",
            "application/json",
            "--cache-control",
            "no-store",
            "--metadata",
            r#"{"source":"relay"}"#,
            "--storage-class",
            "NEARLINE",
            "--predefined-acl",
            "publicRead",
            "--if-not-exists",
        ])
        .unwrap();
        let plan = app.into_plan().unwrap();

        assert_eq!(plan.request.method, Method::Post);
        assert_eq!(plan.request.headers.len(), 2);
        assert_eq!(plan.request.body.as_deref(), Some(b"payload".as_slice()));
        assert_eq!(plan.request.timeout, Duration::from_millis(5000));
        assert!(plan.request.retry_enabled);
        assert_eq!(plan.request.auth, AuthSpec::Bearer { token: "tok".into() });
        assert_eq!(plan.content_type.as_deref(), Some("application/json"));
        assert_eq!(plan.cache_control.as_deref(), Some("no-store"));
        assert_eq!(plan.metadata.unwrap()["source"], "relay");
        assert_eq!(plan.storage_class, StorageClass::Nearline);
        assert_eq!(plan.predefined_acl, Some(PredefinedAcl::PublicRead));
        assert!(plan.skip_if_exists);
    }
}
