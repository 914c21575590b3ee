use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::config::MockDataConfig;
use crate::error::ApiError;
use crate::models::{Dataset, MessageResponse};
use crate::registry::{CreateDataset, RegistryClient};
use crate::sources::Source;
use crate::staging::fetch_mock_data;

use super::dataset_service::annotate_record;

/// Product catalog path on the storefront API
const PRODUCTS_ENDPOINT: &str = "/api/products.json";
/// File the flattened catalog is written to on both dataset sides
const EXPORT_FILE: &str = "store-products.csv";

const CSV_COLUMNS: &[&str] = &[
    "product_id",
    "title",
    "vendor",
    "product_type",
    "handle",
    "status",
    "tags",
    "created_at",
    "updated_at",
    "published_at",
    "variant_id",
    "variant_title",
    "sku",
    "price",
    "compare_at_price",
    "inventory_quantity",
    "weight",
    "weight_unit",
    "requires_shipping",
    "taxable",
    "barcode",
    "image_src",
];

/// Imports datasets from an external storefront and re-syncs them later
/// using the provenance recorded at import time.
pub struct StoreImportService {
    client: Arc<RegistryClient>,
    http: reqwest::Client,
    mock_data: MockDataConfig,
}

impl StoreImportService {
    pub fn new(
        client: Arc<RegistryClient>,
        http: reqwest::Client,
        mock_data: MockDataConfig,
    ) -> Self {
        Self {
            client,
            http,
            mock_data,
        }
    }

    /// Fetch the product catalog, flatten it to CSV and register it as a new
    /// dataset with an `external_store` source entry.
    pub async fn import_dataset(
        &self,
        url: Url,
        name: &str,
        access_token: &str,
        description: Option<&str>,
    ) -> Result<Dataset, ApiError> {
        if self.client.datasets().get_by_name(name)?.is_some() {
            return Err(ApiError::field_conflict(
                "name",
                "A dataset with this name already exists",
            ));
        }

        let products = self.fetch_products(&url, access_token).await?;
        let csv = products_to_csv(&products);

        let staging = TempDir::new().map_err(stage_error)?;
        let real = staging.path().join("real");
        let mock = staging.path().join("mock");
        tokio::fs::create_dir_all(&real).await.map_err(stage_error)?;
        tokio::fs::create_dir_all(&mock).await.map_err(stage_error)?;
        tokio::fs::write(real.join(EXPORT_FILE), &csv)
            .await
            .map_err(stage_error)?;
        fetch_mock_data(&self.http, &self.mock_data.url, &mock.join(EXPORT_FILE)).await?;

        let summary = description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Products exported from {}", url));
        let readme = staging.path().join("README.md");
        tokio::fs::write(&readme, &summary).await.map_err(stage_error)?;

        let auto_approval = self.client.trusted().load()?;
        let record = self.client.datasets().create(CreateDataset {
            name,
            summary: &summary,
            files_dir: &real,
            mock_dir: &mock,
            description_file: &readme,
            auto_approval,
        })?;
        self.client.sources().add(
            record.uid,
            Source::ExternalStore {
                store_url: url,
                access_token: access_token.to_string(),
            },
        )?;
        info!("dataset '{}' imported from external store", record.name);
        annotate_record(&self.client, record)
    }

    /// Re-fetch the catalog recorded for this dataset and replace its
    /// private data with the fresh export. The mock side stays untouched.
    pub async fn sync_dataset(&self, uid: Uuid) -> Result<MessageResponse, ApiError> {
        let source = self
            .client
            .sources()
            .find(uid)?
            .ok_or_else(|| ApiError::bad_request("Dataset does not have an associated store source"))?;
        let Source::ExternalStore {
            store_url,
            access_token,
        } = source;

        let products = self.fetch_products(&store_url, &access_token).await?;
        let csv = products_to_csv(&products);

        let staging = TempDir::new().map_err(stage_error)?;
        let real = staging.path().join("real");
        tokio::fs::create_dir_all(&real).await.map_err(stage_error)?;
        tokio::fs::write(real.join(EXPORT_FILE), &csv)
            .await
            .map_err(stage_error)?;

        self.client.datasets().update_private_data(uid, &real)?;
        info!("dataset {} synced from external store", uid);
        Ok(MessageResponse::new(format!(
            "Dataset {} synced successfully",
            uid
        )))
    }

    async fn fetch_products(&self, url: &Url, access_token: &str) -> Result<Value, ApiError> {
        let endpoint = url
            .join(PRODUCTS_ENDPOINT)
            .map_err(|e| ApiError::bad_request(format!("Invalid store URL: {}", e)))?;
        let response = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                ApiError::upstream_fetch(format!("Failed to fetch products from store: {}", e))
            })?;
        response.json::<Value>().await.map_err(|e| {
            ApiError::upstream_fetch(format!("Store returned invalid product data: {}", e))
        })
    }
}

fn stage_error(e: std::io::Error) -> ApiError {
    ApiError::internal(format!("Failed to stage store export: {}", e))
}

/// Flatten the catalog payload into one CSV row per variant. Products
/// without variants contribute no rows.
fn products_to_csv(payload: &Value) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');

    let empty = Vec::new();
    let products = payload
        .get("products")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    for product in products {
        let variants = product
            .get("variants")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        for variant in variants {
            let fields = [
                field(product, "id"),
                field(product, "title"),
                field(product, "vendor"),
                field(product, "product_type"),
                field(product, "handle"),
                field(product, "status"),
                field(product, "tags"),
                field(product, "created_at"),
                field(product, "updated_at"),
                field(product, "published_at"),
                field(variant, "id"),
                field(variant, "title"),
                field(variant, "sku"),
                field(variant, "price"),
                field(variant, "compare_at_price"),
                field(variant, "inventory_quantity"),
                field(variant, "weight"),
                field(variant, "weight_unit"),
                field(variant, "requires_shipping"),
                field(variant, "taxable"),
                field(variant, "barcode"),
                pointer_field(product, "/image/src"),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }
    }
    out
}

fn field(value: &Value, key: &str) -> String {
    csv_escape(&scalar_to_string(value.get(key).unwrap_or(&Value::Null)))
}

fn pointer_field(value: &Value, pointer: &str) -> String {
    csv_escape(&scalar_to_string(value.pointer(pointer).unwrap_or(&Value::Null)))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
