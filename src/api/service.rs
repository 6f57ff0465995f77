//! Claims API facade
//!
//! One method per backend operation. Each method decides, in order:
//! demo-account short-circuit, client-side validation, the network call
//! (with retries where the operation is read-style), and the offline
//! fallback when the call cannot be completed.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use super::dto::{
    ClaimsAnalysis, DashboardStats, DatasetFile, EmailResult, LoginResponse, ModelInfo,
    PatientProfile, PredictionEmailRequest, PredictionResult, RetrainResult, SignupRequest,
    UploadResult, UserAccount,
};
use super::error::{ApiError, ApiResult};
use crate::client::{
    ApiResponse, CancelToken, Endpoint, Failure, FailureClass, HttpClient, OperationState,
    OperationTracker, ReqwestTransport, RequestBody, RequestContext, RetryController, RetryError,
    RetryPolicy, Transport, WakeUpProbe,
};
use crate::config::Config;
use crate::mock::{self, FallbackReason, Outcome};
use crate::notify::NotificationCenter;
use crate::session::{
    AuthSnapshot, FileSessionStore, Navigator, OriginResolver, Route, RouteTracker, Session,
    SessionGuard, TokenStore,
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

fn validate_email(email: &str) -> ApiResult<()> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("'{}' is not a valid email address", email)))
    }
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ApiResult<T> {
    response
        .json()
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn login_error(failure: Failure) -> ApiError {
    if failure.class.is_unreachable() || failure.status == Some(504) {
        return ApiError::BackendUnavailable;
    }
    match failure.class {
        FailureClass::Unauthorized => ApiError::InvalidCredentials,
        FailureClass::ServerError => ApiError::Server,
        _ => ApiError::Rejected(
            failure
                .detail
                .unwrap_or_else(|| "Login failed. Please try again.".to_string()),
        ),
    }
}

fn signup_error(failure: Failure) -> ApiError {
    match (failure.class, failure.status) {
        (FailureClass::Timeout, _) => ApiError::Timeout,
        (_, Some(400)) => ApiError::Rejected(
            failure
                .detail
                .unwrap_or_else(|| "Invalid signup data".to_string()),
        ),
        (_, Some(409)) => ApiError::DuplicateEmail,
        _ => ApiError::Request(failure),
    }
}

fn mail_not_configured(failure: &Failure) -> bool {
    let detail = failure.detail.as_deref().unwrap_or_default();
    ["Gmail connection failed", "SMTP", "stored locally"]
        .iter()
        .any(|marker| detail.contains(marker))
}

pub struct ClaimsApi {
    http: HttpClient,
    probe: WakeUpProbe,
    retry: RetryController,
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    origin: OriginResolver,
    notifications: Arc<NotificationCenter>,
}

impl ClaimsApi {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let guard = SessionGuard::new(store.clone(), navigator.clone());
        Self {
            http: HttpClient::new(config.api.clone(), transport.clone(), store.clone(), guard),
            probe: WakeUpProbe::new(config.api.clone(), transport),
            retry: RetryController::new(RetryPolicy::from_config(&config.retry)),
            store,
            navigator,
            origin: OriginResolver::with_default_accounts(),
            notifications: Arc::new(NotificationCenter::new()),
        }
    }

    /// Build with the reqwest transport and a file-backed session
    pub fn from_config(config: &Config, start: Route) -> ApiResult<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let store = Arc::new(TokenStore::new(Arc::new(FileSessionStore::new(
            config.session.path(),
        ))));
        let navigator = Arc::new(RouteTracker::new(start));
        Ok(Self::new(config, transport, store, navigator))
    }

    pub fn with_origin_resolver(mut self, origin: OriginResolver) -> Self {
        self.origin = origin;
        self
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }

    fn remember(&self, session: Session) {
        if let Err(e) = self.store.set_session(session) {
            warn!(error = %e, "Session kept in memory only");
        }
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let email = email.trim();

        if let Some(session) = self.origin.resolve_login(email, password) {
            info!(email, is_admin = session.is_admin, "Signed in with demo account");
            let response = LoginResponse {
                access_token: session.token.clone().unwrap_or_default(),
                email: session.user_email.clone(),
                is_admin: session.is_admin,
                token_type: "bearer".to_string(),
            };
            self.remember(session);
            self.navigator.navigate(Route::Dashboard);
            return Ok(response);
        }

        let ctx = RequestContext::form(Endpoint::Login, &[("username", email), ("password", password)]);
        let response = self.http.send(&ctx).await.map_err(login_error)?;
        let login: LoginResponse = decode(&response)?;
        if login.access_token.is_empty() {
            return Err(ApiError::MissingToken);
        }

        let user_email = login.email.clone().unwrap_or_else(|| email.to_string());
        info!(email = %user_email, is_admin = login.is_admin, "Signed in");
        self.remember(Session::real(login.access_token.clone(), user_email, login.is_admin));
        self.navigator.navigate(Route::Dashboard);
        Ok(login)
    }

    pub async fn signup(&self, email: &str, password: &str) -> ApiResult<UserAccount> {
        let email = email.trim();
        validate_email(email)?;
        if password.chars().count() < 6 {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }

        let request = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let ctx = RequestContext::json(Endpoint::Signup, &request)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let response = self.http.send(&ctx).await.map_err(signup_error)?;
        let account = decode(&response)?;
        info!(email, "Account created");
        Ok(account)
    }

    pub fn logout(&self) -> ApiResult<()> {
        self.store.clear_session()?;
        self.navigator.navigate(Route::Login);
        info!("Signed out");
        Ok(())
    }

    pub fn auth_status(&self) -> AuthSnapshot {
        self.store.debug_auth()
    }

    pub async fn current_user(&self, cancel: &CancelToken) -> ApiResult<UserAccount> {
        let session = self.store.snapshot();
        if !session.is_authenticated() {
            return Err(ApiError::Request(Failure::new(FailureClass::Unauthorized)));
        }
        if session.is_demo() {
            return Ok(UserAccount {
                email: session.user_email.clone().unwrap_or_default(),
                is_admin: session.is_admin,
                extra: Default::default(),
            });
        }

        let ctx = RequestContext::new(Endpoint::Me);
        let (http, ctx) = (&self.http, &ctx);
        let mut tracker = OperationTracker::new("me");
        let response = self
            .retry
            .run(&mut tracker, cancel, move |_| http.send(ctx))
            .await?;
        decode(&response)
    }

    // ========================================================================
    // Analytics
    // ========================================================================

    /// Fetch a read-style endpoint, answering from `fallback` when the
    /// session is a demo session, the backend does not implement the
    /// endpoint, or every attempt fails.
    async fn fetch_or_mock<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        cancel: &CancelToken,
        fallback: impl FnOnce() -> T,
    ) -> ApiResult<Outcome<T>> {
        if self.store.snapshot().is_demo() {
            return Ok(Outcome::mock(fallback()));
        }

        let ctx = RequestContext::new(endpoint);
        let (http, ctx) = (&self.http, &ctx);
        let mut tracker = OperationTracker::new(endpoint.path());
        let result = self
            .retry
            .run(&mut tracker, cancel, move |_| http.send(ctx))
            .await;

        match result {
            Ok(response) => {
                if endpoint.spec().optional && response.is_absent_sentinel() {
                    info!(endpoint = endpoint.path(), "Endpoint not available, using sample data");
                    return Ok(Outcome::mock(fallback()));
                }
                match response.json::<T>() {
                    Ok(data) => Ok(Outcome::live(data)),
                    Err(e) => {
                        warn!(endpoint = endpoint.path(), error = %e, "Unreadable response, using sample data");
                        Ok(Outcome::mock(fallback()))
                    }
                }
            }
            Err(RetryError::Cancelled) => Err(ApiError::Cancelled),
            Err(RetryError::Failed(failure)) if failure.class.is_auth() => {
                Err(ApiError::Request(failure))
            }
            Err(RetryError::Failed(failure)) => {
                tracker.advance(OperationState::MockFallback);
                warn!(
                    endpoint = endpoint.path(),
                    class = ?failure.class,
                    "Backend unavailable, using sample data"
                );
                Ok(Outcome::mock(fallback()))
            }
        }
    }

    pub async fn stats(&self, cancel: &CancelToken) -> ApiResult<Outcome<DashboardStats>> {
        self.fetch_or_mock(Endpoint::Stats, cancel, mock::mock_stats)
            .await
    }

    pub async fn claims_analysis(&self, cancel: &CancelToken) -> ApiResult<Outcome<ClaimsAnalysis>> {
        self.fetch_or_mock(Endpoint::ClaimsAnalysis, cancel, mock::mock_claims_analysis)
            .await
    }

    pub async fn model_info(&self, cancel: &CancelToken) -> ApiResult<Outcome<ModelInfo>> {
        self.fetch_or_mock(Endpoint::ModelInfo, cancel, mock::mock_model_info)
            .await
    }

    /// Stats and model info fetched concurrently, each with its own
    /// fallback
    pub async fn dashboard(
        &self,
        cancel: &CancelToken,
    ) -> (ApiResult<Outcome<DashboardStats>>, ApiResult<Outcome<ModelInfo>>) {
        tokio::join!(self.stats(cancel), self.model_info(cancel))
    }

    // ========================================================================
    // Prediction
    // ========================================================================

    pub async fn predict(
        &self,
        profile: &PatientProfile,
        cancel: &CancelToken,
    ) -> ApiResult<Outcome<PredictionResult>> {
        profile.validate().map_err(ApiError::Validation)?;

        if self.store.snapshot().is_demo() {
            return Ok(Outcome::mock(mock::compute_mock(profile)));
        }

        let ctx = RequestContext::json(Endpoint::Predict, profile)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let (http, ctx) = (&self.http, &ctx);
        let mut tracker = OperationTracker::new("predict");
        let result = self
            .retry
            .run(&mut tracker, cancel, move |_| http.send(ctx))
            .await;

        match result {
            Ok(response) => match response.json::<PredictionResult>() {
                Ok(prediction) => Ok(Outcome::live(prediction)),
                Err(e) => {
                    warn!(error = %e, "Unreadable prediction, using offline estimate");
                    Ok(Outcome::mock(mock::compute_mock(profile)))
                }
            },
            Err(RetryError::Cancelled) => Err(ApiError::Cancelled),
            Err(RetryError::Failed(failure)) if failure.class.is_auth() => {
                Err(ApiError::Request(failure))
            }
            Err(RetryError::Failed(failure)) => {
                tracker.advance(OperationState::MockFallback);
                warn!(
                    class = ?failure.class,
                    attempts = tracker.attempts(),
                    "Prediction service unavailable, using offline estimate"
                );
                Ok(Outcome::mock(mock::compute_mock(profile)))
            }
        }
    }

    /// Email a prediction report. Delivery failures are reported in the
    /// returned result rather than as an error.
    pub async fn send_prediction_email(
        &self,
        request: &PredictionEmailRequest,
        cancel: &CancelToken,
    ) -> ApiResult<EmailResult> {
        validate_email(request.email.trim())?;

        if self.store.snapshot().is_demo() {
            let result = EmailResult {
                success: false,
                message: "Email delivery is not available for demo accounts. Use the download option to save the report locally."
                    .to_string(),
                error: None,
            };
            self.notifications.error(&result.message);
            return Ok(result);
        }

        let endpoint = Endpoint::SendPredictionEmail;
        let ctx = RequestContext::json(endpoint, request)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let wake_first = self.probe.should_probe(endpoint);

        let pending = self
            .notifications
            .processing(&format!("Sending prediction report to {}...", request.email));
        let (http, probe, ctx) = (&self.http, &self.probe, &ctx);
        let mut tracker = OperationTracker::new("send-prediction-email");
        let result = self
            .retry
            .run(&mut tracker, cancel, move |_| async move {
                if wake_first {
                    probe.probe(endpoint).await;
                }
                http.send(ctx).await
            })
            .await;
        self.notifications.dismiss(pending);

        let failure = match result {
            Ok(response) => {
                let outcome: EmailResult = decode(&response)?;
                if outcome.success {
                    self.notifications.success(&outcome.message);
                } else {
                    self.notifications.error(&outcome.message);
                }
                return Ok(outcome);
            }
            Err(RetryError::Cancelled) => return Err(ApiError::Cancelled),
            Err(RetryError::Failed(failure)) => failure,
        };

        if mail_not_configured(&failure) {
            let message = format!(
                "Email service not configured properly: {}. Use the download option to save the report locally.",
                failure.user_message()
            );
            self.notifications.error(&message);
            return Ok(EmailResult {
                success: false,
                message,
                error: Some(failure.user_message()),
            });
        }

        let message = format!(
            "Email delivery failed after {} attempts: {}. Please check your internet connection and try again.",
            tracker.attempts(),
            failure.user_message()
        );
        self.notifications.error(&message);
        Ok(EmailResult {
            success: false,
            message,
            error: Some(failure.user_message()),
        })
    }

    // ========================================================================
    // Admin
    // ========================================================================

    fn require_admin(&self, action: &'static str) -> ApiResult<Arc<Session>> {
        let session = self.store.snapshot();
        if session.is_authenticated() && session.is_admin {
            Ok(session)
        } else {
            Err(ApiError::AdminRequired(action))
        }
    }

    /// Check a dataset before upload and count its data rows
    pub fn validate_dataset(file: &DatasetFile) -> ApiResult<u64> {
        if !file.file_name.to_lowercase().ends_with(".csv") {
            return Err(ApiError::Validation("Please select a CSV file".to_string()));
        }
        if file.size() > DatasetFile::MAX_BYTES {
            return Err(ApiError::Validation(
                "File size must be less than 10MB".to_string(),
            ));
        }

        let mut reader = csv::Reader::from_reader(file.bytes.as_slice());
        let headers = reader
            .headers()
            .map_err(|e| ApiError::Validation(format!("Invalid CSV header: {}", e)))?;
        if headers.is_empty() {
            return Err(ApiError::Validation("CSV file has no columns".to_string()));
        }

        let mut rows = 0u64;
        for record in reader.records() {
            record.map_err(|e| ApiError::Validation(format!("Invalid CSV row: {}", e)))?;
            rows += 1;
        }
        Ok(rows)
    }

    /// Shared tail of the admin mutations: auth failures surface, anything
    /// else resolves to a simulated result.
    fn admin_failure<T>(
        &self,
        failure: Failure,
        session: &Session,
        demo: impl FnOnce(FallbackReason) -> T,
    ) -> ApiResult<Outcome<T>> {
        if failure.class.is_auth() {
            if self.origin.is_demo_admin(session) {
                return Ok(Outcome::mock(demo(FallbackReason::DemoAccount)));
            }
            return Err(ApiError::AdminAuthFailed);
        }
        warn!(class = ?failure.class, "Backend unavailable, simulating admin operation");
        Ok(Outcome::mock(demo(FallbackReason::BackendUnavailable)))
    }

    pub async fn upload_dataset(
        &self,
        file: &DatasetFile,
        cancel: &CancelToken,
    ) -> ApiResult<Outcome<UploadResult>> {
        let session = self.require_admin("dataset upload")?;
        let rows = Self::validate_dataset(file)?;
        let size = file.size() as u64;

        let pending = self
            .notifications
            .processing(&format!("Uploading {} ({} rows)...", file.file_name, rows));

        let outcome = if self.origin.is_demo_admin(&session) {
            Ok(Outcome::mock(mock::demo_upload(
                &file.file_name,
                size,
                rows,
                FallbackReason::DemoAccount,
            )))
        } else {
            let ctx = RequestContext::new(Endpoint::AdminUpload).with_body(RequestBody::File {
                field: "file".to_string(),
                file_name: file.file_name.clone(),
                mime: "text/csv".to_string(),
                bytes: file.bytes.clone(),
            });
            self.send_admin(&ctx, cancel).await.and_then(|result| match result {
                Ok(response) => decode::<UploadResult>(&response).map(Outcome::live),
                Err(failure) => self.admin_failure(failure, &session, |reason| {
                    mock::demo_upload(&file.file_name, size, rows, reason)
                }),
            })
        };

        self.notifications.dismiss(pending);
        self.finish_admin(&outcome, |r| r.message.clone());
        outcome
    }

    pub async fn retrain_model(&self, cancel: &CancelToken) -> ApiResult<Outcome<RetrainResult>> {
        let session = self.require_admin("model retraining")?;

        let pending = self
            .notifications
            .processing("Starting model retraining process... This may take a few minutes.");

        let outcome = if self.origin.is_demo_admin(&session) {
            Ok(Outcome::mock(mock::demo_retrain(FallbackReason::DemoAccount)))
        } else {
            let ctx = RequestContext::new(Endpoint::AdminRetrain)
                .with_body(RequestBody::Json(serde_json::json!({})));
            self.send_admin(&ctx, cancel).await.and_then(|result| match result {
                Ok(response) => decode::<RetrainResult>(&response).map(Outcome::live),
                Err(failure) => self.admin_failure(failure, &session, mock::demo_retrain),
            })
        };

        self.notifications.dismiss(pending);
        self.finish_admin(&outcome, |r| r.message.clone());
        outcome
    }

    /// Single attempt; admin mutations are never retried
    async fn send_admin(
        &self,
        ctx: &RequestContext,
        cancel: &CancelToken,
    ) -> ApiResult<Result<ApiResponse, Failure>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.http.send(ctx) => Ok(result),
        }
    }

    fn finish_admin<T>(&self, outcome: &ApiResult<Outcome<T>>, message: impl Fn(&T) -> String) {
        match outcome {
            Ok(outcome) => {
                self.notifications.success(&message(&outcome.data));
            }
            Err(ApiError::Cancelled) => {}
            Err(e) => {
                self.notifications.error(&e.to_string());
            }
        }
    }

    /// Liveness check without retries
    pub async fn health(&self) -> bool {
        self.probe.probe(Endpoint::Health).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{Gender, Region, Smoker};
    use crate::client::testing::{self, ScriptedTransport};
    use crate::notify::NotificationKind;
    use serde_json::json;

    const LOCAL: &str = "http://localhost:8001";
    const COLD: &str = "https://claims-api.onrender.com";

    fn api(
        transport: &Arc<ScriptedTransport>,
        session: Session,
        base_url: &str,
    ) -> (ClaimsApi, Arc<RouteTracker>) {
        let mut config = Config::default();
        config.api.base_url = base_url.to_string();
        config.retry.backoff_step_ms = 1;

        let store = Arc::new(TokenStore::in_memory());
        store.set_session(session).unwrap();
        let nav = Arc::new(RouteTracker::new(Route::Dashboard));
        let api = ClaimsApi::new(&config, transport.clone(), store, nav.clone());
        (api, nav)
    }

    fn real_user() -> Session {
        Session::real("jwt", "user@corp.io", false)
    }

    fn real_admin() -> Session {
        Session::real("jwt", "ops@corp.io", true)
    }

    fn profile() -> PatientProfile {
        PatientProfile {
            age: 52,
            bmi: 29.4,
            gender: Gender::Male,
            smoker: Smoker::Yes,
            region: Region::West,
            premium_annual_inr: Some(32_000.0),
        }
    }

    fn dataset() -> DatasetFile {
        DatasetFile {
            file_name: "claims.csv".to_string(),
            bytes: b"age,bmi,claim\n30,22.1,12000\n45,31.0,25000\n".to_vec(),
        }
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_demo_login_is_offline() {
        let transport = Arc::new(ScriptedTransport::always(testing::refused()));
        let (api, nav) = api(&transport, Session::anonymous(), LOCAL);

        let login = api.login("admin@example.com", "admin123").await.unwrap();

        assert!(login.is_admin);
        assert!(login.access_token.starts_with("demo_token_"));
        assert_eq!(transport.calls(), 0);
        assert!(api.store().is_admin());
        assert!(api.store().snapshot().is_demo());
        assert_eq!(nav.current_route(), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_real_login_stores_session() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({
            "access_token": "jwt-abc", "email": "ana@corp.io", "is_admin": false, "token_type": "bearer"
        }))));
        let (api, _) = api(&transport, Session::anonymous(), LOCAL);

        api.login("ana@corp.io", "hunter22").await.unwrap();

        assert_eq!(api.store().token().as_deref(), Some("jwt-abc"));
        assert!(!api.store().snapshot().is_demo());
        let sent = transport.requests();
        assert!(sent[0].url.ends_with("/login"));
        assert!(matches!(&sent[0].body, RequestBody::Form(fields) if fields[0].0 == "username"));
    }

    #[tokio::test]
    async fn test_login_error_mapping() {
        let cases = vec![
            (testing::status(401, json!({"detail": "Incorrect"})), "INVALID_CREDENTIALS"),
            (testing::refused(), "BACKEND_UNAVAILABLE"),
            (testing::timeout(), "BACKEND_UNAVAILABLE"),
            (testing::status(504, json!({})), "BACKEND_UNAVAILABLE"),
            (testing::status(500, json!({})), "SERVER_ERROR"),
            (testing::status(422, json!({"detail": "Bad form"})), "REJECTED"),
        ];

        for (reply, code) in cases {
            let transport = Arc::new(ScriptedTransport::always(reply));
            let (api, _) = api(&transport, Session::anonymous(), LOCAL);
            let err = api.login("ana@corp.io", "wrong-pass").await.unwrap_err();
            assert_eq!(err.code(), code);
            assert_eq!(transport.calls(), 1, "login is never retried");
        }
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({"email": "a@b.co"}))));
        let (api, _) = api(&transport, Session::anonymous(), LOCAL);
        assert!(matches!(
            api.login("a@b.co", "pw").await,
            Err(ApiError::MissingToken)
        ));
        assert!(!api.store().is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_errors() {
        let transport = Arc::new(ScriptedTransport::sequence(
            vec![
                testing::status(409, json!({})),
                testing::status(400, json!({"detail": "Email already registered"})),
                testing::timeout(),
            ],
            testing::ok(json!({"email": "new@corp.io"})),
        ));
        let (api, _) = api(&transport, Session::anonymous(), LOCAL);

        assert!(matches!(
            api.signup("new@corp.io", "secret1").await,
            Err(ApiError::DuplicateEmail)
        ));
        assert_eq!(
            api.signup("new@corp.io", "secret1").await.unwrap_err().to_string(),
            "Email already registered"
        );
        assert!(matches!(
            api.signup("new@corp.io", "secret1").await,
            Err(ApiError::Timeout)
        ));
        let account = api.signup(" new@corp.io ", "secret1").await.unwrap();
        assert_eq!(account.email, "new@corp.io");
    }

    #[tokio::test]
    async fn test_signup_validation_is_local() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({}))));
        let (api, _) = api(&transport, Session::anonymous(), LOCAL);

        assert!(matches!(api.signup("not-an-email", "secret1").await, Err(ApiError::Validation(_))));
        assert!(matches!(api.signup("a@b.co", "123").await, Err(ApiError::Validation(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({}))));
        let (api, nav) = api(&transport, real_user(), LOCAL);

        api.logout().unwrap();

        assert!(!api.store().is_authenticated());
        assert_eq!(nav.current_route(), Route::Login);
        assert!(!api.auth_status().has_token);
    }

    #[tokio::test]
    async fn test_current_user_for_demo_session() {
        let transport = Arc::new(ScriptedTransport::always(testing::refused()));
        let (api, _) = api(&transport, Session::demo("user@example.com", false, 1), LOCAL);

        let me = api.current_user(&CancelToken::new()).await.unwrap();
        assert_eq!(me.email, "user@example.com");
        assert_eq!(transport.calls(), 0);
    }

    // ------------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_stats_live() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({
            "total_policies": 12, "avg_claim": 100.0, "regions": {"North": 12}
        }))));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let stats = api.stats(&CancelToken::new()).await.unwrap();
        assert!(!stats.is_mock);
        assert_eq!(stats.data.total_policies, 12);
    }

    #[tokio::test]
    async fn test_stats_sentinel_uses_sample_data() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({
            "message": "Statistics endpoint not implemented"
        }))));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let stats = api.stats(&CancelToken::new()).await.unwrap();
        assert!(stats.is_mock);
        assert_eq!(stats.data, mock::mock_stats());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_model_info_falls_back_after_retries() {
        let transport = Arc::new(ScriptedTransport::always(testing::status(503, json!({}))));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let info = api.model_info(&CancelToken::new()).await.unwrap();
        assert!(info.is_mock);
        assert_eq!(info.data.status, "Model loaded");
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_expired_session_on_read_signs_out() {
        let transport = Arc::new(ScriptedTransport::always(testing::status(401, json!({}))));
        let (api, nav) = api(&transport, real_user(), LOCAL);

        let err = api.claims_analysis(&CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Request(f) if f.class == FailureClass::Unauthorized));
        assert_eq!(transport.calls(), 1);
        assert!(!api.store().is_authenticated());
        assert_eq!(nav.current_route(), Route::Login);
    }

    #[tokio::test]
    async fn test_demo_session_reads_are_offline() {
        let transport = Arc::new(ScriptedTransport::always(testing::refused()));
        let (api, _) = api(&transport, Session::demo("admin@gmail.com", true, 1), LOCAL);
        let cancel = CancelToken::new();

        let (stats, info) = api.dashboard(&cancel).await;
        assert!(stats.unwrap().is_mock);
        assert!(info.unwrap().is_mock);
        assert!(api.claims_analysis(&cancel).await.unwrap().is_mock);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_dashboard_mixes_live_and_mock() {
        let transport = Arc::new(ScriptedTransport::sequence(
            vec![
                testing::ok(json!({"total_policies": 5})),
                testing::ok(json!({"message": "Model info not available"})),
            ],
            testing::refused(),
        ));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let (stats, info) = api.dashboard(&CancelToken::new()).await;
        let (stats, info) = (stats.unwrap(), info.unwrap());
        // Replies are consumed in whichever order the joined calls reach
        // the transport; exactly one of them is live
        assert_ne!(stats.is_mock, info.is_mock);
    }

    // ------------------------------------------------------------------------
    // Prediction
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_predict_timeout_falls_back_to_estimate() {
        let transport = Arc::new(ScriptedTransport::always(testing::timeout()));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let outcome = api.predict(&profile(), &CancelToken::new()).await.unwrap();

        assert_eq!(transport.calls(), api.retry_policy().max_attempts as usize);
        assert!(outcome.is_mock);
        assert_eq!(outcome.data, mock::compute_mock(&profile()));
        assert!(api.store().is_authenticated());
    }

    #[tokio::test]
    async fn test_predict_live() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({
            "prediction": 41234.5,
            "confidence": 0.88,
            "input_data": profile(),
        }))));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let outcome = api.predict(&profile(), &CancelToken::new()).await.unwrap();
        assert!(!outcome.is_mock);
        assert_eq!(outcome.data.prediction, 41234.5);
        assert_eq!(transport.requests()[0].timeout, std::time::Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_predict_validation_is_local() {
        let transport = Arc::new(ScriptedTransport::always(testing::timeout()));
        let (api, _) = api(&transport, real_user(), LOCAL);
        let bad = PatientProfile { age: 12, ..profile() };

        assert!(matches!(
            api.predict(&bad, &CancelToken::new()).await,
            Err(ApiError::Validation(_))
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_predict_has_no_fallback() {
        let transport = Arc::new(ScriptedTransport::always(testing::timeout()));
        let (api, _) = api(&transport, real_user(), LOCAL);
        let cancel = CancelToken::new();
        cancel.cancel();

        assert!(matches!(
            api.predict(&profile(), &cancel).await,
            Err(ApiError::Cancelled)
        ));
        assert_eq!(transport.calls(), 0);
    }

    // ------------------------------------------------------------------------
    // Email
    // ------------------------------------------------------------------------

    fn email_request() -> PredictionEmailRequest {
        PredictionEmailRequest {
            email: "patient@mail.io".to_string(),
            prediction: mock::compute_mock(&profile()),
            patient_name: None,
        }
    }

    #[tokio::test]
    async fn test_email_exhausted_reports_failure() {
        let transport = Arc::new(ScriptedTransport::always(testing::timeout()));
        let (api, _) = api(&transport, real_user(), COLD);

        let result = api
            .send_prediction_email(&email_request(), &CancelToken::new())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.message.starts_with("Email delivery failed after 4 attempts"));
        assert_eq!(transport.calls_to("/send-prediction-email"), 4);
        assert_eq!(transport.calls_to("/health"), 4);

        let email_call = transport
            .requests()
            .into_iter()
            .find(|r| r.url.ends_with("/send-prediction-email"))
            .unwrap();
        assert_eq!(email_call.timeout, std::time::Duration::from_secs(240));

        let active = api.notifications().active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_email_success_without_probe_on_local_host() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({
            "success": true, "message": "Report sent"
        }))));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let result = api
            .send_prediction_email(&email_request(), &CancelToken::new())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(transport.calls_to("/health"), 0);
        assert_eq!(transport.requests()[0].timeout, std::time::Duration::from_secs(90));

        let kinds: Vec<_> = api.notifications().history().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Processing, NotificationKind::Success]);
        assert_eq!(api.notifications().active().len(), 1);
    }

    #[tokio::test]
    async fn test_email_mail_server_misconfigured() {
        let transport = Arc::new(ScriptedTransport::always(testing::status(
            400,
            json!({"detail": "SMTP authentication failed"}),
        )));
        let (api, _) = api(&transport, real_user(), LOCAL);

        let result = api
            .send_prediction_email(&email_request(), &CancelToken::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.message.starts_with("Email service not configured properly"));
        assert_eq!(transport.calls(), 1);
    }

    // ------------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_admin_gate_is_local() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({}))));
        let (api, _) = api(&transport, real_user(), LOCAL);
        let cancel = CancelToken::new();

        let err = api.retrain_model(&cancel).await.unwrap_err();
        assert_eq!(err.to_string(), "Admin access required for model retraining");
        let err = api.upload_dataset(&dataset(), &cancel).await.unwrap_err();
        assert_eq!(err.to_string(), "Admin access required for dataset upload");
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_dataset_validation() {
        assert_eq!(ClaimsApi::validate_dataset(&dataset()).unwrap(), 2);

        let wrong_type = DatasetFile {
            file_name: "claims.xlsx".to_string(),
            ..dataset()
        };
        assert!(ClaimsApi::validate_dataset(&wrong_type).is_err());

        let too_big = DatasetFile {
            file_name: "big.csv".to_string(),
            bytes: vec![b'a'; DatasetFile::MAX_BYTES + 1],
        };
        assert!(ClaimsApi::validate_dataset(&too_big).is_err());

        let ragged = DatasetFile {
            file_name: "ragged.CSV".to_string(),
            bytes: b"a,b\n1,2,3\n".to_vec(),
        };
        assert!(ClaimsApi::validate_dataset(&ragged).is_err());
    }

    #[tokio::test]
    async fn test_demo_admin_upload_is_offline() {
        let transport = Arc::new(ScriptedTransport::always(testing::refused()));
        let (api, _) = api(&transport, Session::demo("admin@example.com", true, 7), LOCAL);

        let outcome = api.upload_dataset(&dataset(), &CancelToken::new()).await.unwrap();
        assert!(outcome.is_mock);
        assert_eq!(outcome.data.filename.as_deref(), Some("claims.csv"));
        assert_eq!(outcome.data.dataset_rows, Some(2));
        assert!(outcome.data.message.contains("with 2 samples"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_real_admin_upload_sends_multipart() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({
            "success": true, "message": "Uploaded", "dataset_rows": 2
        }))));
        let (api, _) = api(&transport, real_admin(), LOCAL);

        let outcome = api.upload_dataset(&dataset(), &CancelToken::new()).await.unwrap();
        assert!(!outcome.is_mock);
        assert_eq!(outcome.data.dataset_rows, Some(2));

        let sent = transport.requests();
        assert!(matches!(&sent[0].body, RequestBody::File { field, .. } if field == "file"));
        assert_eq!(sent[0].timeout, std::time::Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_admin_auth_failure_surfaces() {
        let transport = Arc::new(ScriptedTransport::always(testing::status(403, json!({}))));
        let (api, nav) = api(&transport, real_admin(), LOCAL);

        let err = api.retrain_model(&CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::AdminAuthFailed));
        assert!(api.store().is_authenticated());
        assert!(nav.history().is_empty());

        let active = api.notifications().active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_admin_backend_unavailable_is_simulated() {
        let transport = Arc::new(ScriptedTransport::always(testing::refused()));
        let (api, _) = api(&transport, real_admin(), LOCAL);

        let outcome = api.retrain_model(&CancelToken::new()).await.unwrap();
        assert!(outcome.is_mock);
        assert_eq!(outcome.data.new_accuracy, Some(0.93));
        assert_eq!(transport.calls(), 1, "admin mutations are not retried");
        assert_eq!(transport.requests()[0].timeout, std::time::Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_retrain_is_repeatable() {
        let transport = Arc::new(ScriptedTransport::always(testing::status(500, json!({}))));
        let (api, _) = api(&transport, real_admin(), LOCAL);
        let cancel = CancelToken::new();

        let first = api.retrain_model(&cancel).await.unwrap();
        let second = api.retrain_model(&cancel).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_email_pattern() {
        for good in ["ana@corp.io", "first.last+tag@mail.example.org"] {
            assert!(validate_email(good).is_ok(), "{}", good);
        }
        for bad in ["", "ana", "ana@corp", "ana @corp.io", "@corp.io", "ana@@corp.io"] {
            assert!(matches!(validate_email(bad), Err(ApiError::Validation(_))), "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let transport = Arc::new(ScriptedTransport::always(testing::ok(json!({"status": "ok"}))));
        let (up, _) = api(&transport, Session::anonymous(), LOCAL);
        assert!(up.health().await);
        assert_eq!(transport.calls_to("/health"), 1);

        let down = Arc::new(ScriptedTransport::always(testing::refused()));
        let (offline, _) = api(&down, Session::anonymous(), LOCAL);
        assert!(!offline.health().await);
        assert_eq!(down.calls(), 1);
    }
}
