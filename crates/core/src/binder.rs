//! Parameter binding: source values → converted → assigned.

use std::sync::Arc;

use tracing::trace;

use crate::convert::ConversionService;
use crate::error::{BindingError, FieldError};
use crate::schema::{Bindable, ParameterDecl, ParameterSchema, SchemaCache};
use crate::source::ParameterSource;

/// Binds parameter sources onto [`Bindable`] targets.
///
/// Cheap to clone; clones share the conversion table and schema cache.
#[derive(Debug, Clone)]
pub struct ParameterBinder {
    conversions: Arc<ConversionService>,
    schemas: Arc<SchemaCache>,
}

impl ParameterBinder {
    pub fn new(conversions: Arc<ConversionService>) -> Self {
        Self {
            conversions,
            schemas: Arc::new(SchemaCache::new()),
        }
    }

    pub fn conversions(&self) -> &ConversionService {
        &self.conversions
    }

    pub fn schema<B: Bindable>(&self) -> Arc<ParameterSchema> {
        self.schemas.get_or_compute::<B>()
    }

    /// Bind every declared parameter of `target` from `source`.
    ///
    /// Absent optional parameters are skipped and keep their current value;
    /// absent required ones and failed conversions are collected per field.
    /// Every field is attempted; if any failed, the target may be partially
    /// bound and must be discarded.
    pub fn bind<B: Bindable>(&self, target: &mut B, source: &dyn ParameterSource) -> Result<(), BindingError> {
        let schema = self.schema::<B>();
        let failures: Vec<FieldError> = schema
            .params()
            .iter()
            .filter_map(|decl| self.bind_field(target, decl, source).err())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BindingError::new(schema.owner(), failures))
        }
    }

    fn bind_field<B: Bindable>(
        &self,
        target: &mut B,
        decl: &ParameterDecl,
        source: &dyn ParameterSource,
    ) -> Result<(), FieldError> {
        let Some(raw) = source.get(decl.name()).filter(|v| !v.is_null()) else {
            return if decl.is_required() {
                Err(FieldError::missing(decl.name()))
            } else {
                Ok(())
            };
        };

        trace!(field = decl.name(), from = %raw.kind(), to = %decl.ty(), "binding parameter");
        let value = self
            .conversions
            .convert(raw, decl.ty())
            .map_err(|e| FieldError::invalid(decl.name(), e))?;
        target
            .assign(decl.name(), value)
            .map_err(|e| FieldError::invalid(decl.name(), e))
    }
}

impl Default for ParameterBinder {
    fn default() -> Self {
        Self::new(Arc::new(ConversionService::new()))
    }
}
