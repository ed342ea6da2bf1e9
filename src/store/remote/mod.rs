mod client;
mod records;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use url::Url;

use self::client::RecordClient;
use self::records::{DealRecord, FetchRequest, StageUpdate, DEAL_FIELDS, DEAL_TABLE};
use super::DealStore;
use crate::auth::PublicKey;
use crate::error::{DealBoardError, Result};
use crate::models::Deal;

const PAGE_SIZE: usize = 100;

/// Deal store backed by the hosted record service.
pub struct RemoteStore {
    client: RecordClient,
}

impl RemoteStore {
    pub fn new(base_url: &Url, project_id: String, public_key: Option<PublicKey>) -> Result<Self> {
        let client = RecordClient::new(base_url, project_id, public_key)?;

        Ok(Self { client })
    }

    async fn fetch_one(&self, deal_id: i64) -> Result<Deal> {
        let query = FetchRequest::by_id(&DEAL_FIELDS, deal_id);
        let response = self
            .client
            .fetch_records::<DealRecord>(DEAL_TABLE, &query)
            .await?;

        if !response.success {
            return Err(DealBoardError::Api(
                response
                    .message
                    .unwrap_or_else(|| format!("Failed to fetch deal {deal_id}")),
            ));
        }

        response
            .data
            .unwrap_or_default()
            .into_iter()
            .find(|record| record.id == deal_id)
            .map(Deal::from)
            .ok_or(DealBoardError::NotFound(deal_id))
    }
}

#[async_trait]
impl DealStore for RemoteStore {
    async fn fetch_all(&self) -> Result<Vec<Deal>> {
        let mut deals = Vec::new();
        let mut offset = 0;

        loop {
            let query = FetchRequest::page(&DEAL_FIELDS, PAGE_SIZE, offset);
            let response = self
                .client
                .fetch_records::<DealRecord>(DEAL_TABLE, &query)
                .await?;

            if !response.success {
                return Err(DealBoardError::Api(
                    response
                        .message
                        .unwrap_or_else(|| "Failed to fetch deals".to_string()),
                ));
            }

            let page = response.data.unwrap_or_default();
            let fetched_count = page.len();
            deals.extend(page.into_iter().map(Deal::from));

            info!(
                "Offset {offset}: fetched {fetched_count} deals (total: {})",
                deals.len()
            );

            if fetched_count < PAGE_SIZE {
                break;
            }

            offset += PAGE_SIZE;
        }

        Ok(deals)
    }

    async fn update_stage(&self, deal_id: i64, new_stage: &str) -> Result<Deal> {
        info!("Moving deal {deal_id} to {new_stage}");

        let current = self.fetch_one(deal_id).await?;
        if current.stage == new_stage {
            debug!("Deal {deal_id} is already in {new_stage}");
        }

        let update = StageUpdate::new(&current, new_stage, Utc::now());
        let response = self
            .client
            .update_records::<_, DealRecord>(DEAL_TABLE, vec![update])
            .await?;

        if !response.success {
            return Err(DealBoardError::Api(
                response
                    .message
                    .unwrap_or_else(|| format!("Failed to update deal {deal_id}")),
            ));
        }

        let mut results = response.results.into_iter();
        match results.next() {
            Some(result) if result.success => result.data.map(Deal::from).ok_or_else(|| {
                DealBoardError::Api(format!("Update of deal {deal_id} returned no record"))
            }),
            Some(result) => {
                let message = result.failure_message();
                warn!("Record service rejected update of deal {deal_id}: {message}");
                Err(DealBoardError::Api(message))
            }
            None => Err(DealBoardError::Api(format!(
                "Update of deal {deal_id} returned no results"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    const FETCH_PATH: &str = "/api/v1/projects/crm-7/tables/deal_c/records/fetch";
    const UPDATE_PATH: &str = "/api/v1/projects/crm-7/tables/deal_c/records";

    fn store(server: &mockito::ServerGuard, key: Option<&str>) -> RemoteStore {
        let base = Url::parse(&server.url()).unwrap();
        RemoteStore::new(&base, "crm-7".to_string(), key.and_then(PublicKey::parse)).unwrap()
    }

    fn record(id: i64, stage: &str) -> serde_json::Value {
        json!({
            "Id": id,
            "title_c": format!("Deal {id}"),
            "value_c": 1000,
            "status_c": stage,
            "CreatedOn": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_all_maps_records_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", FETCH_PATH)
            .match_header("authorization", "Bearer pk_test")
            .match_body(Matcher::PartialJson(json!({"pagingInfo": {"offset": 0}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"success": true, "data": [record(4, "Lead"), record(2, "Proposal")]})
                    .to_string(),
            )
            .create_async()
            .await;

        let deals = store(&server, Some("pk_test")).fetch_all().await.unwrap();

        mock.assert_async().await;
        let ids: Vec<_> = deals.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![4, 2]);
        assert_eq!(deals[1].stage, "Proposal");
    }

    #[tokio::test]
    async fn test_fetch_all_follows_pages() {
        let mut server = mockito::Server::new_async().await;
        let full_page: Vec<_> = (1..=100).map(|id| record(id, "Lead")).collect();

        let first = server
            .mock("POST", FETCH_PATH)
            .match_body(Matcher::PartialJson(json!({"pagingInfo": {"offset": 0}})))
            .with_status(200)
            .with_body(json!({"success": true, "data": full_page}).to_string())
            .create_async()
            .await;
        let second = server
            .mock("POST", FETCH_PATH)
            .match_body(Matcher::PartialJson(json!({"pagingInfo": {"offset": 100}})))
            .with_status(200)
            .with_body(json!({"success": true, "data": [record(101, "Qualified")]}).to_string())
            .create_async()
            .await;

        let deals = store(&server, None).fetch_all().await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(deals.len(), 101);
        assert_eq!(deals[100].id, 101);
    }

    #[tokio::test]
    async fn test_fetch_all_reports_service_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", FETCH_PATH)
            .with_status(200)
            .with_body(json!({"success": false, "message": "Invalid public key"}).to_string())
            .create_async()
            .await;

        let err = store(&server, None).fetch_all().await.unwrap_err();

        assert!(matches!(err, DealBoardError::Api(ref m) if m == "Invalid public key"));
    }

    #[tokio::test]
    async fn test_fetch_all_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", FETCH_PATH)
            .with_status(503)
            .create_async()
            .await;

        let err = store(&server, None).fetch_all().await.unwrap_err();

        assert!(matches!(err, DealBoardError::Network(_)));
    }

    async fn stored_record(
        server: &mut mockito::ServerGuard,
        record: serde_json::Value,
    ) -> mockito::Mock {
        let id_filter = format!(r#""Values":\[{}\]"#, record["Id"]);
        server
            .mock("POST", FETCH_PATH)
            .match_body(Matcher::Regex(id_filter))
            .with_status(200)
            .with_body(json!({"success": true, "data": [record]}).to_string())
            .create_async()
            .await
    }

    fn updated(record: serde_json::Value) -> String {
        json!({"success": true, "results": [{"success": true, "data": record}]}).to_string()
    }

    #[tokio::test]
    async fn test_update_stage_returns_stored_deal() {
        let mut server = mockito::Server::new_async().await;
        let _fetch = stored_record(&mut server, record(9, "Proposal")).await;
        let mock = server
            .mock("PATCH", UPDATE_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""Id":9"#.to_string()),
                Matcher::Regex(r#""status_c":"Negotiation""#.to_string()),
                Matcher::Regex(r#""last_status_change_c":"#.to_string()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "results": [{"success": true, "data": record(9, "Negotiation")}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let deal = store(&server, None)
            .update_stage(9, "Negotiation")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(deal.id, 9);
        assert_eq!(deal.stage, "Negotiation");
    }

    #[tokio::test]
    async fn test_update_stage_record_failure() {
        let mut server = mockito::Server::new_async().await;
        let _fetch = stored_record(&mut server, record(404, "Qualified")).await;
        let _mock = server
            .mock("PATCH", UPDATE_PATH)
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "results": [{"success": false, "message": "Record does not exist"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = store(&server, None)
            .update_stage(404, "Lead")
            .await
            .unwrap_err();

        assert!(matches!(err, DealBoardError::Api(ref m) if m == "Record does not exist"));
    }

    #[tokio::test]
    async fn test_update_stage_without_results() {
        let mut server = mockito::Server::new_async().await;
        let _fetch = stored_record(&mut server, record(1, "Qualified")).await;
        let _mock = server
            .mock("PATCH", UPDATE_PATH)
            .with_status(200)
            .with_body(json!({"success": true}).to_string())
            .create_async()
            .await;

        let err = store(&server, None)
            .update_stage(1, "Lead")
            .await
            .unwrap_err();

        assert!(matches!(err, DealBoardError::Api(_)));
    }

    #[tokio::test]
    async fn test_update_to_current_stage_keeps_change_timestamp() {
        let mut server = mockito::Server::new_async().await;
        let _fetch = stored_record(&mut server, record(1, "Lead")).await;
        let mock = server
            .mock("PATCH", UPDATE_PATH)
            .match_body(Matcher::Json(json!({"records": [{"Id": 1, "status_c": "Lead"}]})))
            .with_status(200)
            .with_body(updated(record(1, "Lead")))
            .create_async()
            .await;

        let deal = store(&server, None).update_stage(1, "Lead").await.unwrap();

        mock.assert_async().await;
        assert_eq!(deal.stage, "Lead");
    }

    #[tokio::test]
    async fn test_update_stamps_change_no_earlier_than_creation() {
        let mut server = mockito::Server::new_async().await;
        let mut future = record(5, "Lead");
        future["CreatedOn"] = json!("2999-01-01T00:00:00Z");
        let _fetch = stored_record(&mut server, future).await;
        let mock = server
            .mock("PATCH", UPDATE_PATH)
            .match_body(Matcher::Json(json!({"records": [{
                "Id": 5,
                "status_c": "Qualified",
                "last_status_change_c": "2999-01-01T00:00:00+00:00"
            }]})))
            .with_status(200)
            .with_body(updated(record(5, "Qualified")))
            .create_async()
            .await;

        store(&server, None)
            .update_stage(5, "Qualified")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_stage_of_missing_record() {
        let mut server = mockito::Server::new_async().await;
        let _fetch = server
            .mock("POST", FETCH_PATH)
            .with_status(200)
            .with_body(json!({"success": true, "data": []}).to_string())
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", UPDATE_PATH)
            .expect(0)
            .create_async()
            .await;

        let err = store(&server, None)
            .update_stage(77, "Lead")
            .await
            .unwrap_err();

        assert!(matches!(err, DealBoardError::NotFound(77)));
        patch.assert_async().await;
    }
}
