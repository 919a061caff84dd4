//! Steadfast courier API client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::domain::ports::{BulkParcelResult, Consignment, CourierClient, ParcelRequest};
use crate::error::CourierError;

/// Implementation of the Steadfast merchant API client
pub struct SteadfastClient {
    http: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl SteadfastClient {
    pub fn new(base_url: String, api_key: String, secret_key: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            secret_key,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.api_url(path))
            .header("Api-Key", &self.api_key)
            .header("Secret-Key", &self.secret_key)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.api_url(path))
            .header("Api-Key", &self.api_key)
            .header("Secret-Key", &self.secret_key)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CourierError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CourierError::Deserialization(e.to_string()))
        } else if status.as_u16() == 401 {
            Err(CourierError::Unauthorized)
        } else if status.as_u16() == 429 {
            Err(CourierError::RateLimited)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(CourierError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Steadfast reports validation failures inside a 200 response body
fn check_body_status(status: Option<u16>, message: Option<String>) -> Result<(), CourierError> {
    match status {
        Some(code) if code != 200 => Err(CourierError::Rejected(
            message.unwrap_or_else(|| format!("courier returned status {}", code)),
        )),
        _ => Ok(()),
    }
}

#[derive(Serialize)]
struct BulkOrderRequest<'a> {
    data: &'a [ParcelRequest],
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    consignment: Option<Consignment>,
}

/// Bulk booking returns either a bare array or one wrapped in `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum BulkOrderResponse {
    List(Vec<BulkParcelResult>),
    Wrapped { data: Vec<BulkParcelResult> },
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    delivery_status: Option<String>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    current_balance: f64,
}

impl SteadfastClient {
    async fn fetch_status(&self, path: String) -> Result<String, CourierError> {
        let resp = self.get(&path).send().await?;
        let body: StatusResponse = self.handle_response(resp).await?;
        check_body_status(body.status, body.message)?;
        body.delivery_status.ok_or_else(|| {
            CourierError::Deserialization("response has no delivery_status".to_string())
        })
    }
}

#[async_trait]
impl CourierClient for SteadfastClient {
    async fn create_order(&self, parcel: &ParcelRequest) -> Result<Consignment, CourierError> {
        let resp = self.post("/create_order").json(parcel).send().await?;

        let body: CreateOrderResponse = self.handle_response(resp).await?;
        check_body_status(body.status, body.message.clone())?;
        body.consignment.ok_or_else(|| {
            CourierError::Rejected(
                body.message
                    .unwrap_or_else(|| "no consignment in response".to_string()),
            )
        })
    }

    async fn bulk_create_orders(
        &self,
        parcels: &[ParcelRequest],
    ) -> Result<Vec<BulkParcelResult>, CourierError> {
        let resp = self
            .post("/create_order/bulk-order")
            .json(&BulkOrderRequest { data: parcels })
            .send()
            .await?;

        let body: BulkOrderResponse = self.handle_response(resp).await?;
        Ok(match body {
            BulkOrderResponse::List(results) | BulkOrderResponse::Wrapped { data: results } => {
                results
            }
        })
    }

    async fn status_by_consignment_id(
        &self,
        consignment_id: &str,
    ) -> Result<String, CourierError> {
        self.fetch_status(format!("/status_by_cid/{}", encode(consignment_id)))
            .await
    }

    async fn status_by_invoice(&self, invoice: &str) -> Result<String, CourierError> {
        self.fetch_status(format!("/status_by_invoice/{}", encode(invoice)))
            .await
    }

    async fn status_by_tracking_code(&self, tracking_code: &str) -> Result<String, CourierError> {
        self.fetch_status(format!("/status_by_trackingcode/{}", encode(tracking_code)))
            .await
    }

    async fn current_balance(&self) -> Result<f64, CourierError> {
        let resp = self.get("/get_balance").send().await?;
        let body: BalanceResponse = self.handle_response(resp).await?;
        check_body_status(body.status, body.message)?;
        Ok(body.current_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SteadfastClient {
        SteadfastClient::new(
            server.uri(),
            "api-key".to_string(),
            "secret-key".to_string(),
        )
    }

    fn parcel(invoice: &str) -> ParcelRequest {
        ParcelRequest {
            invoice: invoice.to_string(),
            recipient_name: "Rahim Uddin".to_string(),
            recipient_phone: "01711111111".to_string(),
            recipient_address: "House 1, Road 2, Dhanmondi, Dhaka".to_string(),
            cod_amount: 1060.0,
            note: None,
        }
    }

    #[tokio::test]
    async fn create_order_sends_credentials_and_parses_consignment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create_order"))
            .and(header("Api-Key", "api-key"))
            .and(header("Secret-Key", "secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "message": "Consignment has been created successfully.",
                "consignment": {
                    "consignment_id": 1424107,
                    "invoice": "INV-1",
                    "tracking_code": "15BAEB8A",
                    "recipient_name": "Rahim Uddin",
                    "recipient_phone": "01711111111",
                    "recipient_address": "House 1, Road 2, Dhanmondi, Dhaka",
                    "cod_amount": 1060,
                    "status": "in_review",
                    "note": null
                }
            })))
            .mount(&server)
            .await;

        let consignment = client_for(&server)
            .create_order(&parcel("INV-1"))
            .await
            .unwrap();
        assert_eq!(consignment.consignment_id.as_deref(), Some("1424107"));
        assert_eq!(consignment.tracking_code, "15BAEB8A");
        assert_eq!(consignment.status, "in_review");
    }

    #[tokio::test]
    async fn create_order_surfaces_rejections_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create_order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 400,
                "message": "The invoice has already been taken."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_order(&parcel("INV-1"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CourierError::Rejected(ref m) if m.contains("already been taken")),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn bulk_create_wraps_parcels_in_data() {
        let server = MockServer::start().await;
        let parcels = vec![parcel("INV-1"), parcel("INV-2")];
        Mock::given(method("POST"))
            .and(path("/create_order/bulk-order"))
            .and(body_json(json!({ "data": parcels })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"invoice": "INV-1", "consignment_id": 11, "tracking_code": "AAA", "status": "success"},
                {"invoice": "INV-2", "consignment_id": null, "tracking_code": null, "status": "error", "error": "bad phone"}
            ])))
            .mount(&server)
            .await;

        let results = client_for(&server)
            .bulk_create_orders(&parcels)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(results[1].error.as_deref(), Some("bad phone"));
    }

    #[tokio::test]
    async fn status_lookups_use_their_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status_by_cid/1424107"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 200, "delivery_status": "delivered"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status_by_invoice/INV-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 200, "delivery_status": "hold"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status_by_trackingcode/15BAEB8A"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 200, "delivery_status": "in_review"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(
            client.status_by_consignment_id("1424107").await.unwrap(),
            "delivered"
        );
        assert_eq!(client.status_by_invoice("INV-1").await.unwrap(), "hold");
        assert_eq!(
            client.status_by_tracking_code("15BAEB8A").await.unwrap(),
            "in_review"
        );
    }

    #[tokio::test]
    async fn balance_and_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_balance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 200, "current_balance": 1520.5})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status_by_cid/1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status_by_cid/2"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.current_balance().await.unwrap(), 1520.5);
        assert!(matches!(
            client.status_by_consignment_id("1").await,
            Err(CourierError::Unauthorized)
        ));
        assert!(matches!(
            client.status_by_consignment_id("2").await,
            Err(CourierError::Api { status: 500, .. })
        ));
    }
}
