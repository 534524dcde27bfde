//! Header-mode signing scenarios.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sigstack_sigv4::payload::EMPTY_PAYLOAD_HASH;
    use sigstack_sigv4::{
        CredentialsError, EnvCredentialsProvider, SignerError, SignerOptions, SigningParams,
    };

    use crate::{epoch, session_credentials, signer};

    fn list_tables_request<B>(body: B) -> http::Request<B> {
        http::Request::post("https://dynamodb.us-east-1.amazonaws.com/")
            .header("Content-Type", "application/x-amz-json-1.0")
            .header("X-Amz-Target", "DynamoDB_20120810.ListTables")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_should_sign_dynamodb_request_at_epoch() {
        let signer = signer(session_credentials(), SignerOptions::default());
        let mut request = list_tables_request(());
        let params = SigningParams::new(EMPTY_PAYLOAD_HASH, "dynamodb", "us-east-1", epoch());

        signer.sign_http(&mut request, &params).await.unwrap();

        assert_eq!(
            request.headers()["authorization"],
            "AWS4-HMAC-SHA256 Credential=AKID/19700101/us-east-1/dynamodb/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-amz-security-token;x-amz-target, \
             Signature=f3310b62533b90b228f05839590838738673b0e75026a704bac0addb03bbb1f0"
        );
        assert_eq!(request.headers()["x-amz-date"], "19700101T000000Z");
        assert_eq!(request.headers()["x-amz-security-token"], "SESSION");
    }

    #[tokio::test]
    async fn test_should_produce_identical_headers_on_repeat() {
        let signer = signer(session_credentials(), SignerOptions::default());
        let params = SigningParams::new(EMPTY_PAYLOAD_HASH, "dynamodb", "us-east-1", epoch());

        let mut first = list_tables_request(());
        let mut second = list_tables_request(());
        signer.sign_http(&mut first, &params).await.unwrap();
        signer.sign_http(&mut second, &params).await.unwrap();

        assert_eq!(first.headers(), second.headers());
        assert_eq!(first.uri(), second.uri());
    }

    #[tokio::test]
    async fn test_should_leave_body_in_place() {
        let signer = signer(session_credentials(), SignerOptions::default());
        let mut request = list_tables_request(b"{}".to_vec());
        let body_ptr = request.body().as_ptr();
        let params = SigningParams::new(
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a",
            "dynamodb",
            "us-east-1",
            epoch(),
        );

        signer.sign_http(&mut request, &params).await.unwrap();

        assert_eq!(request.body().as_ptr(), body_ptr);
        assert_eq!(request.body().as_slice(), b"{}");
    }

    #[tokio::test]
    async fn test_should_sign_concurrently() {
        let signer = Arc::new(signer(session_credentials(), SignerOptions::default()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let signer = Arc::clone(&signer);
                tokio::spawn(async move {
                    let mut request = list_tables_request(());
                    let params =
                        SigningParams::new(EMPTY_PAYLOAD_HASH, "dynamodb", "us-east-1", epoch());
                    signer.sign_http(&mut request, &params).await.unwrap().signature
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                "f3310b62533b90b228f05839590838738673b0e75026a704bac0addb03bbb1f0"
            );
        }
    }

    #[tokio::test]
    async fn test_should_abort_before_touching_request_without_credentials() {
        let signer = sigstack_sigv4::Signer::new(Arc::new(EnvCredentialsProvider::new()));
        if std::env::var("AWS_ACCESS_KEY_ID").is_ok() {
            return;
        }
        let mut request = list_tables_request(());
        let headers_before = request.headers().clone();
        let params = SigningParams::new(EMPTY_PAYLOAD_HASH, "dynamodb", "us-east-1", epoch());

        let err = signer.sign_http(&mut request, &params).await.unwrap_err();

        assert!(matches!(
            err,
            SignerError::Credentials(CredentialsError::NotLoaded(_))
        ));
        assert_eq!(request.headers(), &headers_before);
    }
}
