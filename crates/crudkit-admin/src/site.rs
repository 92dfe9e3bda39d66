//! The admin site.
//!
//! [`AdminSite`] wires a [`ResourceRegistry`] to a document backend, the
//! settings, and the preference store. Pages ask it for ready-to-use forms
//! and rendered tables.

use std::sync::Arc;

use crudkit_core::{CrudResult, Settings};
use crudkit_forms::backend::{DocumentSource, MutationExecutor, Operation};
use crudkit_forms::cells::CellProps;
use crudkit_forms::{FormConfig, FormError, FormResult, ResourceForm};
use tracing::{info, warn};

use crate::page_query::{load_reference_options, PageQuery, PageQueryOptions, PageResult};
use crate::preferences::{self, open_preferences, PreferenceStore};
use crate::registry::ResourceRegistry;
use crate::store::InMemoryDocumentStore;

/// The admin: registered resources plus the services their pages use.
pub struct AdminSite {
    registry: Arc<ResourceRegistry>,
    executor: Arc<dyn MutationExecutor>,
    source: Arc<dyn DocumentSource>,
    pages: Arc<dyn PageQuery>,
    preferences: Arc<dyn PreferenceStore>,
    settings: Settings,
}

impl AdminSite {
    /// Creates a site backed by `store`, with preferences opened from
    /// `settings`.
    pub fn new(registry: ResourceRegistry, store: InMemoryDocumentStore, settings: Settings) -> Self {
        let preferences: Arc<dyn PreferenceStore> = Arc::from(open_preferences(&settings));
        Self {
            registry: Arc::new(registry),
            executor: Arc::new(store.clone()),
            source: Arc::new(store.clone()),
            pages: Arc::new(store),
            preferences,
            settings,
        }
    }

    /// Replaces the preference store.
    #[must_use]
    pub fn preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn preference_store(&self) -> &dyn PreferenceStore {
        self.preferences.as_ref()
    }

    /// Returns the phone region in effect: the user's pick, else the
    /// configured default.
    pub fn phone_region(&self) -> String {
        preferences::phone_region(
            self.preferences.as_ref(),
            &self.settings.default_phone_region,
        )
    }

    /// Stores the user's phone region.
    pub fn set_phone_region(&self, region: &str) -> CrudResult<()> {
        preferences::set_phone_region(self.preferences.as_ref(), region)
    }

    /// Returns the form locale: the settings with the user's phone region.
    pub fn form_config(&self) -> FormConfig {
        FormConfig {
            phone_region: self.phone_region(),
            ..FormConfig::from(&self.settings)
        }
    }

    /// Returns the table locale: the settings with the user's phone region.
    pub fn cell_props(&self) -> CellProps {
        CellProps {
            phone_region: self.phone_region(),
            ..CellProps::from(&self.settings)
        }
    }

    fn page_size(&self, resource: &str) -> usize {
        preferences::page_size(self.preferences.as_ref(), resource, self.settings.page_size)
    }

    /// Builds and loads a form, with reference options filled in.
    ///
    /// A document that fails to load does not fail the call: the form is
    /// returned still loading, showing the error.
    ///
    /// # Errors
    ///
    /// Spec errors propagate, including unknown resources and unsupported
    /// field types.
    pub async fn open_form(&self, resource: &str, operation: Operation) -> FormResult<ResourceForm> {
        let registry: Arc<ResourceRegistry> = Arc::clone(&self.registry);
        let mut form = ResourceForm::new(resource, operation, registry, Arc::clone(&self.executor))
            .with_config(self.form_config());
        match form.load(self.source.as_ref()).await {
            Ok(()) => {}
            Err(FormError::Core(err)) => {
                warn!(resource, error = %err, "form opened without its document");
                return Ok(form);
            }
            Err(err) => return Err(err),
        }
        let options = PageQueryOptions::new().page_size(self.settings.page_size);
        load_reference_options(self.pages.as_ref(), &mut form, &options).await?;
        info!(resource, operation = %form.operation(), "form opened");
        Ok(form)
    }

    /// Queries one page of a resource, ordered by the page's choice or the
    /// resource default, sized by the user's preference.
    ///
    /// # Errors
    ///
    /// Fails for unknown resources and query errors.
    pub async fn list(&self, resource: &str, page: usize) -> FormResult<PageResult> {
        let spec = self.registry.resource(resource)?;
        let mut options = PageQueryOptions::new()
            .page(page)
            .page_size(self.page_size(resource));
        if let Some(ordering) = spec.default_ordering() {
            options = options.ordering(ordering);
        }
        Ok(self.pages.query(resource, &options).await?)
    }

    /// Renders one page of a resource as a table.
    ///
    /// # Errors
    ///
    /// Fails for unknown resources and query errors.
    pub async fn render_list(&self, resource: &str, page: usize) -> FormResult<String> {
        let table = self.registry.resource(resource)?.table(&self.cell_props());
        let result = self.list(resource, page).await?;
        if result.loading {
            return Ok(table.render_loading(self.page_size(resource)));
        }
        Ok(table.render_html(&result.documents))
    }
}

impl std::fmt::Debug for AdminSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSite")
            .field("resources", &self.registry.names())
            .finish_non_exhaustive()
    }
}
