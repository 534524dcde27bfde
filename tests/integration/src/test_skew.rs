//! Clock-skew feedback scenarios.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone, Utc};
    use sigstack_sigv4::payload::EMPTY_PAYLOAD_HASH;
    use sigstack_sigv4::{
        ClockSkew, HeaderSigner, PayloadHashing, SignHttpRequestStage, SignerOptions,
        SigningContext, SkewObserver,
    };

    use crate::{fixed_signing_clock, session_credentials, signer};

    fn stage(skew: &Arc<ClockSkew>) -> SignHttpRequestStage {
        let signer = signer(session_credentials(), SignerOptions::default());
        let provider = Arc::clone(signer.credentials_provider());
        let signer: Arc<dyn HeaderSigner> = Arc::new(signer);
        let wall = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        SignHttpRequestStage::new(provider, signer, fixed_signing_clock(wall, Arc::clone(skew)))
            .with_payload_hashing(PayloadHashing::Compute)
    }

    fn request() -> http::Request<()> {
        http::Request::get("https://example.amazonaws.com/").body(()).unwrap()
    }

    #[tokio::test]
    async fn test_should_shift_next_signing_time_by_observed_skew() {
        let skew = Arc::new(ClockSkew::new());
        let stage = stage(&skew);
        let observer = SkewObserver::new(Arc::clone(&skew));

        let mut first = request();
        let local_request_time = stage.clock().wall_time();
        stage
            .sign(&mut first, &mut SigningContext::new("execute-api", "us-east-1"))
            .await
            .unwrap();
        assert_eq!(first.headers()["x-amz-date"], "20150830T123600Z");

        let response = http::Response::builder()
            .header("Date", "Sun, 30 Aug 2015 12:36:07 GMT")
            .body(())
            .unwrap();
        observer.observe_response(&response, local_request_time);
        assert_eq!(skew.get(), TimeDelta::seconds(7));

        let mut second = request();
        stage
            .sign(&mut second, &mut SigningContext::new("execute-api", "us-east-1"))
            .await
            .unwrap();
        assert_eq!(second.headers()["x-amz-date"], "20150830T123607Z");
        assert_eq!(first.headers()["x-amz-date"], "20150830T123600Z");
    }

    #[tokio::test]
    async fn test_should_ignore_response_without_usable_date() {
        let skew = Arc::new(ClockSkew::new());
        let stage = stage(&skew);
        let observer = SkewObserver::new(Arc::clone(&skew));
        skew.set(TimeDelta::seconds(2));

        let no_date = http::Response::builder().body(()).unwrap();
        let bad_date = http::Response::builder()
            .header("Date", "not a date")
            .body(())
            .unwrap();
        assert!(
            observer
                .observe_response(&no_date, stage.clock().wall_time())
                .is_none()
        );
        assert!(
            observer
                .observe_response(&bad_date, stage.clock().wall_time())
                .is_none()
        );

        let mut request = request();
        let mut ctx = SigningContext::new("execute-api", "us-east-1")
            .with_payload_hash(EMPTY_PAYLOAD_HASH);
        stage.sign(&mut request, &mut ctx).await.unwrap();
        assert_eq!(request.headers()["x-amz-date"], "20150830T123602Z");
    }

    #[tokio::test]
    async fn test_should_tolerate_concurrent_observers_and_signers() {
        let skew = Arc::new(ClockSkew::new());
        let stage = Arc::new(stage(&skew));

        let mut handles = Vec::new();
        for i in 0..8_i64 {
            let observer = SkewObserver::new(Arc::clone(&skew));
            let stage = Arc::clone(&stage);
            handles.push(tokio::spawn(async move {
                let local = stage.clock().wall_time();
                observer.observe(local + TimeDelta::seconds(i), local);
                let mut request = request();
                stage
                    .sign(&mut request, &mut SigningContext::new("execute-api", "us-east-1"))
                    .await
                    .unwrap();
                request.headers()["x-amz-date"].to_str().unwrap().to_owned()
            }));
        }

        for handle in handles {
            let date = handle.await.unwrap();
            assert!(date.starts_with("20150830T1236"));
            let seconds: u32 = date[13..15].parse().unwrap();
            assert!(seconds < 8);
        }
    }
}
