//! End-to-end request tests against an in-memory database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shopbill_api::{build_router, ApiConfig, AppState};
use shopbill_db::{Database, DbConfig};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, ApiConfig::default());
        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn register(&self, email: &str) {
        let (status, body) = self
            .call(
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "email": email,
                    "username": "Asha",
                    "password": "s3cret-pass",
                    "confirm_password": "s3cret-pass",
                    "shop_name": "Asha Stores",
                    "phone": "9876543210"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": email, "password": "s3cret-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access"].as_str().unwrap().to_string()
    }

    async fn owner(&self, email: &str) -> String {
        self.register(email).await;
        self.login(email).await
    }

    async fn admin(&self, email: &str) -> String {
        self.register(email).await;
        let (account, _) = self
            .state
            .db
            .accounts()
            .credentials(email)
            .await
            .unwrap()
            .unwrap();
        self.state.db.accounts().set_admin(&account.id, true).await.unwrap();
        self.login(email).await
    }

    async fn upload(&self, token: &str, file_name: &str, content: &str) -> (StatusCode, Value) {
        let boundary = "shopbill-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/import-products")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    assert_eq!(body["schema"], "current");
}

#[tokio::test]
async fn register_then_login() {
    let app = TestApp::new().await;
    app.register("Asha@Shop.in").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "asha@shop.in", "password": "s3cret-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], "asha@shop.in");
    assert_eq!(body["user"]["plan_status"], "inactive");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "asha@shop.in", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("asha@shop.in").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "email": "ASHA@shop.in",
                "username": "Other",
                "password": "s3cret-pass",
                "confirm_password": "s3cret-pass",
                "shop_name": "Other Stores",
                "phone": "1234567890"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "email");

    let (_, body) = app
        .call(
            Method::POST,
            "/check-email",
            None,
            Some(json!({ "email": "asha@shop.in" })),
        )
        .await;
    assert_eq!(body["exists"], true);
}

#[tokio::test]
async fn mismatched_password_is_a_validation_error() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "email": "asha@shop.in",
                "username": "Asha",
                "password": "s3cret-pass",
                "confirm_password": "s3cret-pasS",
                "shop_name": "Asha Stores",
                "phone": "9876543210"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "confirm_password");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .call(Method::GET, "/products", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sale_computes_totals_and_debits_stock() {
    let app = TestApp::new().await;
    let token = app.owner("asha@shop.in").await;

    let (status, product) = app
        .call(
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({
                "name": "Rice",
                "purchase_price_cents": 8000,
                "selling_price_cents": 10000,
                "stock_quantity": 10,
                "min_stock_level": 2,
                "tax_rate_bps": 1800
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["product_code"], "PRD-0001");
    assert_eq!(product["low_stock"], false);
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, sale) = app
        .call(
            Method::POST,
            "/sales",
            Some(&token),
            Some(json!({
                "customer_name": "Ravi",
                "items": [{ "product_id": product_id, "quantity": 3 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["invoice_number"], "INV-00001");
    assert_eq!(sale["taxable_amount_cents"], 30000);
    assert_eq!(sale["tax_amount_cents"], 5400);
    assert_eq!(sale["total_amount_cents"], 35400);
    assert_eq!(sale["items"][0]["product_name"], "Rice");

    let (_, product) = app
        .call(
            Method::GET,
            &format!("/products/{product_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(product["stock_quantity"], 7);

    // Referenced by a sale.
    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/products/{product_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, sales) = app
        .call(Method::GET, "/sales?min_total=354.00", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn huge_sale_quantity_is_a_validation_error() {
    let app = TestApp::new().await;
    let token = app.owner("asha@shop.in").await;

    let (_, product) = app
        .call(
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({
                "name": "Rice",
                "purchase_price_cents": 8000,
                "selling_price_cents": 10000,
                "stock_quantity": 10
            })),
        )
        .await;
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/sales",
            Some(&token),
            Some(json!({
                "items": [{ "product_id": product_id, "quantity": i64::MAX / 1000 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "quantity");

    let (_, product) = app
        .call(
            Method::GET,
            &format!("/products/{product_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(product["stock_quantity"], 10);
}

#[tokio::test]
async fn owners_cannot_see_each_others_products() {
    let app = TestApp::new().await;
    let asha = app.owner("asha@shop.in").await;
    let ravi = app.owner("ravi@shop.in").await;

    let (_, product) = app
        .call(
            Method::POST,
            "/products",
            Some(&asha),
            Some(json!({
                "name": "Dal",
                "purchase_price_cents": 100,
                "selling_price_cents": 150
            })),
        )
        .await;
    let uri = format!("/products/{}", product["id"].as_str().unwrap());

    let (status, body) = app.call(Method::GET, &uri, Some(&ravi), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, list) = app.call(Method::GET, "/products", Some(&ravi), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn csv_import_reports_bad_rows() {
    let app = TestApp::new().await;
    let token = app.owner("asha@shop.in").await;

    let csv = "Product Name,Purchase Price,Selling Price,Stock Quantity,Tax Rate\n\
               Rice,80,100.00,10,5\n\
               Dal,abc,90,5,5\n\
               Oil,120,150,4,18";
    let (status, report) = app.upload(&token, "stock.csv", csv).await;
    assert_eq!(status, StatusCode::MULTI_STATUS, "{report}");
    assert_eq!(report["success_count"], 2);
    assert_eq!(report["error_count"], 1);
    assert_eq!(report["errors"][0]["row"], 2);
    assert_eq!(report["errors"][0]["row_data"]["product_name"], "Dal");
    assert_eq!(report["errors"][0]["errors"][0]["field"], "purchase_price");

    let (_, products) = app.call(Method::GET, "/products", Some(&token), None).await;
    assert_eq!(products.as_array().unwrap().len(), 2);

    let (status, report) = app
        .upload(&token, "more.csv", "product_name,purchase_price,selling_price\nSugar,40,45")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["success_count"], 1);
}

#[tokio::test]
async fn spreadsheet_import_is_rejected() {
    let app = TestApp::new().await;
    let token = app.owner("asha@shop.in").await;

    let (status, body) = app.upload(&token, "stock.xlsx", "binary").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn bill_settings_default_then_patch() {
    let app = TestApp::new().await;
    let token = app.owner("asha@shop.in").await;

    let (status, settings) = app
        .call(Method::GET, "/bill-settings/mine", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["header"], "Your Business Name");
    assert_eq!(settings["tax_rate_bps"], 1800);

    let (status, settings) = app
        .call(
            Method::PATCH,
            "/bill-settings/mine",
            Some(&token),
            Some(json!({ "footer": "Visit again" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["footer"], "Visit again");
    assert_eq!(settings["header"], "Your Business Name");
}

#[tokio::test]
async fn only_admins_answer_tickets() {
    let app = TestApp::new().await;
    let owner = app.owner("asha@shop.in").await;
    let admin = app.admin("admin@shop.in").await;

    let (status, ticket) = app
        .call(
            Method::POST,
            "/tickets",
            Some(&owner),
            Some(json!({
                "subject": "Printer",
                "description": "Invoice prints blank"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/tickets/{}/provide_feedback", ticket["id"].as_str().unwrap());
    let feedback = json!({ "status": "Resolved", "admin_feedback": "Driver updated" });

    let (status, body) = app
        .call(Method::POST, &uri, Some(&owner), Some(feedback.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, ticket) = app
        .call(Method::POST, &uri, Some(&admin), Some(feedback))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["status"], "Resolved");

    let (_, all) = app.call(Method::GET, "/tickets", Some(&admin), None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn subscription_status_follows_subscribe() {
    let app = TestApp::new().await;
    let owner = app.owner("asha@shop.in").await;
    let admin = app.admin("admin@shop.in").await;

    let (_, status_body) = app
        .call(Method::GET, "/subscriptions/status", Some(&owner), None)
        .await;
    assert_eq!(status_body["plan_status"], "inactive");

    let plan = json!({ "name": "Monthly", "price_cents": 49900, "duration_minutes": 43200 });
    let (status, _) = app
        .call(Method::POST, "/plans", Some(&owner), Some(plan.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, plan) = app
        .call(Method::POST, "/plans", Some(&admin), Some(plan))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, report) = app
        .call(
            Method::POST,
            "/subscriptions",
            Some(&owner),
            Some(json!({ "plan_id": plan["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{report}");
    assert_eq!(report["plan_status"], "active");

    let (_, report) = app
        .call(Method::GET, "/subscriptions/status", Some(&owner), None)
        .await;
    assert_eq!(report["plan_status"], "active");
    assert_eq!(report["plan"], "Monthly");
}
