//! `SeaORM` implementation of the `ImportService` trait.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::db::Store;
use crate::domain::{Actor, AuditAction, EntityType};
use crate::import::{AssetField, ImportRow, ResolvedMapping, parse_csv, parse_row, suggest_mappings};
use crate::models::asset::AssetInput;
use crate::models::category::CategoryInput;
use crate::models::directory_user::DirectoryUser;
use crate::models::directory_user::DirectoryUserFilter;
use crate::models::import_template::{ImportTemplate, ImportTemplateInput};
use crate::services::asset_service::AssetService;
use crate::services::audit::AuditService;
use crate::services::import_service::{
    ImportError, ImportPreview, ImportReport, ImportRequest, ImportService, RowOutcome, RowStatus,
};

const MAX_TEMPLATE_NAME_LEN: usize = 100;

pub struct SeaOrmImportService {
    store: Store,
    audit: AuditService,
    assets: Arc<dyn AssetService>,
    config: ImportConfig,
}

/// Lookup tables built once per import run.
struct References {
    categories: HashMap<String, i32>,
    owners_by_employee: HashMap<String, DirectoryUser>,
    owners_by_email: HashMap<String, DirectoryUser>,
}

impl References {
    fn owner(&self, reference: &str) -> Option<&DirectoryUser> {
        self.owners_by_employee
            .get(reference)
            .or_else(|| self.owners_by_email.get(&reference.to_lowercase()))
    }
}

impl SeaOrmImportService {
    #[must_use]
    pub fn new(
        store: Store,
        audit: AuditService,
        assets: Arc<dyn AssetService>,
        config: ImportConfig,
    ) -> Self {
        Self {
            store,
            audit,
            assets,
            config,
        }
    }

    async fn load_references(&self) -> Result<References, ImportError> {
        let categories = self
            .store
            .categories()
            .list()
            .await?
            .into_iter()
            .map(|c| (c.name.to_lowercase(), c.id))
            .collect();

        let users = self
            .store
            .directory_users()
            .list(&DirectoryUserFilter::default())
            .await?;

        let mut owners_by_employee = HashMap::new();
        let mut owners_by_email = HashMap::new();
        for user in users {
            owners_by_email.insert(user.email.to_lowercase(), user.clone());
            owners_by_employee.insert(user.employee_id.clone(), user);
        }

        Ok(References {
            categories,
            owners_by_employee,
            owners_by_email,
        })
    }

    async fn mapping_for(
        &self,
        request: &ImportRequest,
    ) -> Result<BTreeMap<String, String>, ImportError> {
        match request.template_id {
            Some(id) => Ok(self
                .store
                .import_templates()
                .get(id)
                .await?
                .ok_or(ImportError::TemplateNotFound(id))?
                .mappings),
            None => Ok(request.mapping.clone()),
        }
    }

    /// Creates a category discovered in the sheet.
    async fn create_category(&self, name: &str, actor: &Actor) -> Result<i32, String> {
        let fields = CategoryInput {
            name: name.to_string(),
            description: None,
            parent_id: None,
        }
        .normalize()?;

        let category = self
            .store
            .categories()
            .create(&fields)
            .await
            .map_err(|e| format!("Failed to create category '{name}': {e}"))?;

        self.audit
            .record_create(EntityType::Category, category.id, actor, &category)
            .await
            .map_err(|e| format!("Failed to audit category '{name}': {e}"))?;

        info!(category_id = category.id, name = %category.name, "Category created by import");
        Ok(category.id)
    }

    /// Resolves references and stores (or, for a dry run, only checks) one row.
    async fn import_row(
        &self,
        row: ImportRow,
        refs: &mut References,
        pending_categories: &mut HashSet<String>,
        categories_created: &mut Vec<String>,
        request: &ImportRequest,
        actor: &Actor,
    ) -> Result<(RowStatus, Option<i32>), Vec<String>> {
        let mut errors = Vec::new();

        let category_id = match row.category.as_deref() {
            None => None,
            Some(name) => match refs.categories.get(&name.to_lowercase()).copied() {
                Some(id) => Some(id),
                None if !request.create_missing_categories => {
                    errors.push(format!("Category '{name}' does not exist"));
                    None
                }
                None if request.dry_run => {
                    if pending_categories.insert(name.to_lowercase()) {
                        categories_created.push(name.to_string());
                    }
                    None
                }
                None => match self.create_category(name, actor).await {
                    Ok(id) => {
                        refs.categories.insert(name.to_lowercase(), id);
                        categories_created.push(name.to_string());
                        Some(id)
                    }
                    Err(e) => {
                        errors.push(e);
                        None
                    }
                },
            },
        };

        let assigned_to = match row.owner.as_deref() {
            None => None,
            Some(reference) => match refs.owner(reference) {
                Some(user) if user.active => Some(user.id),
                Some(user) => {
                    errors.push(format!("Directory user '{}' is inactive", user.email));
                    None
                }
                None => {
                    errors.push(format!("No directory user matches '{reference}'"));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let fields = AssetInput {
            asset_tag: row.asset_tag,
            name: row.name,
            asset_type: row.asset_type,
            status: row.status,
            category_id,
            assigned_to,
            serial_number: row.serial_number,
            manufacturer: row.manufacturer,
            model: row.model,
            location: row.location,
            notes: row.notes,
            purchase_date: row.purchase_date,
            purchase_cost: row.purchase_cost,
            warranty_expires: row.warranty_expires,
        }
        .normalize()
        .map_err(|e| vec![e])?;

        if request.dry_run {
            let taken = self
                .store
                .assets()
                .tag_taken(&fields.asset_tag, None)
                .await
                .map_err(|e| vec![e.to_string()])?;
            if taken {
                return Err(vec![format!(
                    "Asset tag '{}' is already in use",
                    fields.asset_tag
                )]);
            }
            return Ok((RowStatus::Valid, None));
        }

        let asset = self
            .assets
            .create_imported(fields, actor)
            .await
            .map_err(|e| vec![e.to_string()])?;

        Ok((RowStatus::Created, Some(asset.id)))
    }

    fn validate_template(input: ImportTemplateInput) -> Result<ImportTemplateInput, ImportError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ImportError::Validation(
                "Template name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
            return Err(ImportError::Validation(format!(
                "Template name must be {MAX_TEMPLATE_NAME_LEN} characters or less"
            )));
        }

        let mut mappings = BTreeMap::new();
        let mut used = HashSet::new();
        for (column, field) in input.mappings {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let parsed = field.parse::<AssetField>().map_err(ImportError::Validation)?;
            if !used.insert(parsed) {
                return Err(ImportError::Validation(format!(
                    "Field '{parsed}' is mapped more than once"
                )));
            }
            mappings.insert(column, parsed.to_string());
        }

        if mappings.is_empty() {
            return Err(ImportError::Validation(
                "Template must map at least one column".to_string(),
            ));
        }

        Ok(ImportTemplateInput { name, mappings })
    }
}

#[async_trait]
impl ImportService for SeaOrmImportService {
    async fn preview(&self, csv: &str) -> Result<ImportPreview, ImportError> {
        let parsed = parse_csv(csv, self.config.max_rows).map_err(ImportError::InvalidCsv)?;

        let suggestions = suggest_mappings(&parsed.headers, self.config.suggestion_threshold);
        let sample_rows = parsed
            .rows
            .iter()
            .take(self.config.sample_rows)
            .map(|(_, record)| record.clone())
            .collect();

        Ok(ImportPreview {
            total_rows: parsed.rows.len(),
            headers: parsed.headers,
            sample_rows,
            delimiter: parsed.delimiter,
            suggestions,
        })
    }

    async fn import_assets(
        &self,
        request: ImportRequest,
        actor: &Actor,
    ) -> Result<ImportReport, ImportError> {
        let parsed =
            parse_csv(&request.csv, self.config.max_rows).map_err(ImportError::InvalidCsv)?;

        let mapping = self.mapping_for(&request).await?;
        let resolved =
            ResolvedMapping::resolve(&parsed.headers, &mapping).map_err(ImportError::InvalidMapping)?;

        let mut refs = self.load_references().await?;
        let mut pending_categories = HashSet::new();
        let mut categories_created = Vec::new();
        let mut seen_tags: HashSet<String> = HashSet::new();
        let mut rows = Vec::with_capacity(parsed.rows.len());

        for (line, record) in &parsed.rows {
            let outcome = match parse_row(*line, record, &resolved) {
                Err(errors) => Err(errors),
                Ok(row) => {
                    let tag = row.asset_tag.trim().to_uppercase();
                    if seen_tags.insert(tag.clone()) {
                        self.import_row(
                            row,
                            &mut refs,
                            &mut pending_categories,
                            &mut categories_created,
                            &request,
                            actor,
                        )
                        .await
                    } else {
                        Err(vec![format!("Asset tag '{tag}' appears more than once in the file")])
                    }
                }
            };

            let asset_tag = resolved_tag(record, &resolved);
            rows.push(match outcome {
                Ok((status, asset_id)) => RowOutcome {
                    line: *line,
                    status,
                    asset_tag,
                    asset_id,
                    errors: Vec::new(),
                },
                Err(errors) => {
                    warn!(line = *line, errors = ?errors, "Import row rejected");
                    RowOutcome {
                        line: *line,
                        status: RowStatus::Error,
                        asset_tag,
                        asset_id: None,
                        errors,
                    }
                }
            });
        }

        let failed = rows.iter().filter(|r| r.status == RowStatus::Error).count();
        let report = ImportReport {
            dry_run: request.dry_run,
            total: rows.len(),
            succeeded: rows.len() - failed,
            failed,
            categories_created,
            rows,
        };

        if !request.dry_run {
            metrics::counter!("assetdesk_assets_imported_total")
                .increment(u64::try_from(report.succeeded).unwrap_or(u64::MAX));
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            dry_run = report.dry_run,
            actor = %actor.name,
            "Asset import finished"
        );

        Ok(report)
    }

    async fn list_templates(&self) -> Result<Vec<ImportTemplate>, ImportError> {
        Ok(self.store.import_templates().list().await?)
    }

    async fn create_template(
        &self,
        input: ImportTemplateInput,
        actor: &Actor,
    ) -> Result<ImportTemplate, ImportError> {
        let input = Self::validate_template(input)?;
        let repo = self.store.import_templates();

        if repo.name_taken(&input.name, None).await? {
            return Err(ImportError::Conflict(format!(
                "Template '{}' already exists",
                input.name
            )));
        }

        let template = repo
            .create(&input.name, &input.mappings, Some(&actor.name))
            .await?;
        self.audit
            .record_create(EntityType::ImportTemplate, template.id, actor, &template)
            .await?;

        Ok(template)
    }

    async fn update_template(
        &self,
        id: i32,
        input: ImportTemplateInput,
        actor: &Actor,
    ) -> Result<ImportTemplate, ImportError> {
        let input = Self::validate_template(input)?;
        let repo = self.store.import_templates();

        let current = repo.get(id).await?.ok_or(ImportError::TemplateNotFound(id))?;
        if repo.name_taken(&input.name, Some(id)).await? {
            return Err(ImportError::Conflict(format!(
                "Template '{}' already exists",
                input.name
            )));
        }

        let updated = repo
            .update(id, &input.name, &input.mappings)
            .await?
            .ok_or(ImportError::TemplateNotFound(id))?;
        self.audit
            .record_change(
                EntityType::ImportTemplate,
                id,
                AuditAction::Update,
                actor,
                &current,
                &updated,
            )
            .await?;

        Ok(updated)
    }

    async fn delete_template(&self, id: i32, actor: &Actor) -> Result<(), ImportError> {
        let repo = self.store.import_templates();
        let current = repo.get(id).await?.ok_or(ImportError::TemplateNotFound(id))?;

        repo.delete(id).await?;
        self.audit
            .record_delete(EntityType::ImportTemplate, id, actor, &current)
            .await?;

        Ok(())
    }
}

fn resolved_tag(record: &[String], mapping: &ResolvedMapping) -> Option<String> {
    mapping
        .value(record, AssetField::AssetTag)
        .map(str::to_uppercase)
}
