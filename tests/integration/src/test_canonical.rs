//! Canonicalization scenarios observed through the signer.

#[cfg(test)]
mod tests {
    use sigstack_sigv4::payload::EMPTY_PAYLOAD_HASH;
    use sigstack_sigv4::{CredentialScope, SignerOptions, SigningParams};

    use crate::{epoch, session_credentials, signer};

    #[tokio::test]
    async fn test_should_honor_path_escaping_switch() {
        let params = SigningParams::new(EMPTY_PAYLOAD_HASH, "execute-api", "us-east-1", epoch());

        let escaped = signer(session_credentials(), SignerOptions::default());
        let mut request = http::Request::get("https://example.amazonaws.com/foo*bar/a=b")
            .body(())
            .unwrap();
        let signed = escaped.sign_http(&mut request, &params).await.unwrap();
        assert_eq!(signed.canonical_request.uri, "/foo%2Abar/a%3Db");

        let unescaped = signer(
            session_credentials(),
            SignerOptions {
                disable_uri_path_escaping: true,
                ..SignerOptions::default()
            },
        );
        let mut request = http::Request::get("https://example.amazonaws.com/foo*bar/a=b")
            .body(())
            .unwrap();
        let signed = unescaped.sign_http(&mut request, &params).await.unwrap();
        assert_eq!(signed.canonical_request.uri, "/foo*bar/a=b");
    }

    #[tokio::test]
    async fn test_should_join_repeated_headers_and_collapse_spaces() {
        let signer = signer(session_credentials(), SignerOptions::default());
        let mut request = http::Request::put("https://example.amazonaws.com/")
            .header("X-Amz-Meta-List", "a    b")
            .header("x-amz-meta-list", "  c \t d ")
            .body(())
            .unwrap();
        let params = SigningParams::new(EMPTY_PAYLOAD_HASH, "s3", "us-east-1", epoch());

        let signed = signer.sign_http(&mut request, &params).await.unwrap();

        assert!(
            signed
                .canonical_request
                .headers
                .lines()
                .any(|line| line == "x-amz-meta-list:a b,c \t d")
        );
        assert_eq!(
            signed.signed_headers,
            "host;x-amz-date;x-amz-meta-list;x-amz-security-token"
        );
    }

    #[tokio::test]
    async fn test_should_keep_canonical_query_stable_on_resign() {
        let signer = signer(session_credentials(), SignerOptions::default());
        let params = SigningParams::new(EMPTY_PAYLOAD_HASH, "s3", "us-east-1", epoch());
        let mut request =
            http::Request::get("https://example.amazonaws.com/?z=1&a=b+c&a=%2B&key=x%2Fy")
                .body(())
                .unwrap();

        let first = signer.sign_http(&mut request, &params).await.unwrap();
        let rewritten = request.uri().query().map(ToOwned::to_owned);
        let second = signer.sign_http(&mut request, &params).await.unwrap();

        assert_eq!(first.canonical_request.query, "a=%2B&a=b%20c&key=x%2Fy&z=1");
        assert_eq!(second.canonical_request.query, first.canonical_request.query);
        assert_eq!(request.uri().query().map(ToOwned::to_owned), rewritten);
        assert_eq!(first.signature, second.signature);
    }

    #[test]
    fn test_should_round_trip_credential_scope() {
        let scope = CredentialScope::new(&epoch(), "eu-west-1", "dynamodb");
        let parsed = CredentialScope::parse(&scope.to_string()).unwrap();

        assert_eq!(parsed, scope);
        assert_eq!(
            (parsed.date(), parsed.region(), parsed.service()),
            ("19700101", "eu-west-1", "dynamodb")
        );
    }
}
