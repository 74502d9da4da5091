// Audit trail and counters
//
// Read-only endpoints outside the per-resource collections: the audit log,
// per-entity field histories and summaries, and named counters.

use std::collections::BTreeMap;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{AuditLog, Counter, FieldHistory, FieldSummary};
use crate::query::{ListDefaults, ListQuery};
use crate::resource::Page;

const AUDIT_LOGS_PATH: &str = "/v1/audit-logs";

impl ApiClient {
    /// `GET /v1/audit-logs`.
    ///
    /// With `group_by_operation_id` the server folds entries that belong
    /// to one operation into a single row.
    pub async fn audit_logs(
        &self,
        query: &ListQuery,
        group_by_operation_id: bool,
    ) -> Result<Page<AuditLog>, Error> {
        let mut params = query.to_pairs(ListDefaults::STANDARD);
        push_grouping(&mut params, group_by_operation_id);
        self.get(self.api_url(AUDIT_LOGS_PATH)?, &params).await
    }

    /// `GET /v1/audit-logs/{entity_id}/field-histories`.
    ///
    /// The server reads the entity filter from `search`, so `query.filter`
    /// is sent under that key.
    pub async fn field_histories(
        &self,
        entity_id: &str,
        query: &ListQuery,
    ) -> Result<Page<FieldHistory>, Error> {
        let query = ListQuery {
            search: query.filter.clone(),
            filter: BTreeMap::new(),
            ..query.clone()
        };
        let params = query.to_pairs(ListDefaults::STANDARD);
        self.get(
            self.entity_url(AUDIT_LOGS_PATH, &[entity_id, "field-histories"])?,
            &params,
        )
        .await
    }

    /// `GET /v1/audit-logs/{entity_id}/fields-summary`.
    pub async fn fields_summary(
        &self,
        entity_id: &str,
        query: &ListQuery,
    ) -> Result<Page<FieldSummary>, Error> {
        let params = query.to_pairs(ListDefaults::STANDARD);
        self.get(
            self.entity_url(AUDIT_LOGS_PATH, &[entity_id, "fields-summary"])?,
            &params,
        )
        .await
    }

    /// `GET /v1/counters/by-name?name=`.
    pub async fn counter(&self, name: &str) -> Result<Counter, Error> {
        let params = [("name".to_owned(), name.to_owned())];
        self.get(self.api_url("/v1/counters/by-name")?, &params).await
    }
}

fn push_grouping(params: &mut Vec<(String, String)>, group: bool) {
    if group {
        params.push(("group_by_operation_id".into(), "true".into()));
    }
}
