//! Per-action pipeline: validate, build, fetch once, post-process.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::client::GeoFetcher;
use super::model::{
    LayerList, MapExport, NearestFacility, StatisticsResponse, TradeoffReport,
};
use super::nearest::select_nearest;
use super::normalize;
use super::query::{self, Intent, QueryOptions, QueryRequest};
use super::request::{
    parse_body, ExportMapRequest, GetNearestFacilityRequest, GetStatisticsRequest,
    GetTradeoffsRequest, ListLayersRequest, QueryFeaturesRequest,
};
use super::threshold::{compare, TradeoffCriteria};
use crate::config::Settings;
use crate::error::{ConnectorError, ErrorKind};

/// Message returned when a nearest-facility search comes back empty.
pub const NO_FACILITY_FOUND: &str = "No facility found nearby.";
/// Message returned when a tradeoff query has no feature collection.
pub const NO_FEATURES_RETURNED: &str = "No features returned from layer";

/// Stateless entry point for every tool action.
///
/// Holds only immutable configuration and the fetcher, so one instance is
/// shared by all in-flight requests.
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn GeoFetcher>,
    options: QueryOptions,
    district_name_field: String,
}

impl Dispatcher {
    pub fn new(fetcher: Arc<dyn GeoFetcher>, settings: &Settings) -> Self {
        Self {
            fetcher,
            options: settings.query_options(),
            district_name_field: settings.district_name_field.clone(),
        }
    }

    /// Run one action from a raw JSON body and return the response body.
    pub async fn dispatch(&self, intent: Intent, body: Value) -> Result<Value, ConnectorError> {
        info!("Dispatching {}", intent);
        let result = self.run(intent, body).await;
        if let Err(e) = &result {
            log_failure(intent, e);
        }
        result
    }

    async fn run(&self, intent: Intent, body: Value) -> Result<Value, ConnectorError> {
        match intent {
            Intent::ListLayers => to_json(self.list_layers(parse_body(body)?).await),
            Intent::QueryFeatures => self.query_features(parse_body(body)?).await,
            Intent::GetStatistics => to_json(self.get_statistics(parse_body(body)?).await),
            Intent::ExportMap => to_json(self.export_map(parse_body(body)?).await),
            Intent::GetTradeoffs => to_json(self.get_tradeoffs(parse_body(body)?).await),
            Intent::GetNearestFacility => {
                to_json(self.get_nearest_facility(parse_body(body)?).await)
            }
        }
    }

    pub async fn list_layers(&self, request: ListLayersRequest) -> Result<LayerList, ConnectorError> {
        let params = request.validate()?;
        let payload = self.fetch(query::list_layers(&params, &self.options)).await?;
        normalize::layer_list(&payload)
    }

    pub async fn query_features(&self, request: QueryFeaturesRequest) -> Result<Value, ConnectorError> {
        let params = request.validate()?;
        let payload = self.fetch(query::query_features(&params, &self.options)).await?;
        normalize::feature_query(payload)
    }

    pub async fn get_statistics(
        &self,
        request: GetStatisticsRequest,
    ) -> Result<StatisticsResponse, ConnectorError> {
        let params = request.validate()?;
        let payload = self.fetch(query::statistics(&params)).await?;
        normalize::statistics(payload)
    }

    pub async fn export_map(&self, request: ExportMapRequest) -> Result<MapExport, ConnectorError> {
        let params = request.validate()?;
        let payload = self.fetch(query::export_map(&params)).await?;
        normalize::map_export(payload)
    }

    pub async fn get_tradeoffs(
        &self,
        request: GetTradeoffsRequest,
    ) -> Result<TradeoffReport, ConnectorError> {
        let params = request.validate()?;
        let payload = self.fetch(query::tradeoffs(&params, &self.options)).await?;
        let features = normalize::features(&payload)?
            .ok_or_else(|| ConnectorError::MissingCollection(NO_FEATURES_RETURNED.to_string()))?;
        let report = compare(
            &features,
            &TradeoffCriteria::from(&params),
            &self.district_name_field,
        );
        debug!(
            "{} of {} features passed the tradeoff thresholds",
            report.count,
            features.len()
        );
        Ok(report)
    }

    pub async fn get_nearest_facility(
        &self,
        request: GetNearestFacilityRequest,
    ) -> Result<NearestFacility, ConnectorError> {
        let params = request.validate()?;
        let payload = self
            .fetch(query::nearest_facility(&params, &self.options))
            .await?;
        let candidates = normalize::features(&payload)?.unwrap_or_default();
        debug!("{} nearest-facility candidates", candidates.len());
        select_nearest(candidates, (params.x, params.y))
            .ok_or_else(|| ConnectorError::NotFound(NO_FACILITY_FOUND.to_string()))
    }

    async fn fetch(&self, request: QueryRequest) -> Result<Value, ConnectorError> {
        debug!("GET {}", request.redacted_url());
        self.fetcher.fetch(&request).await
    }
}

fn to_json<T: Serialize>(result: Result<T, ConnectorError>) -> Result<Value, ConnectorError> {
    let value = result?;
    serde_json::to_value(value).map_err(|e| ConnectorError::Decode(e.to_string()))
}

fn log_failure(intent: Intent, e: &ConnectorError) {
    match e.kind() {
        ErrorKind::ClientInput => info!("Rejected {}: {}", intent, e),
        ErrorKind::NotFound => info!("{}: {}", intent, e),
        ErrorKind::Service => warn!("{} failed on the remote service: {}", intent, e),
        ErrorKind::Transport => error!("{} failed: {}", intent, e),
    }
}
