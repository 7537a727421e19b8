//! Path-style resource URIs, e.g. `/api/Country/lv`.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::application::resources::{ResourceError, ResourceResolver};
use crate::domain::values::ResourceObject;

const DEFAULT_PREFIX: &str = "/api";

/// Maps resources to `{prefix}/{type}/{id}` and back.
///
/// Without a known set every well-formed URI resolves; with one, only the
/// listed resources do.
#[derive(Debug, Clone)]
pub struct PathResourceResolver {
    prefix: String,
    known: Option<HashSet<ResourceObject>>,
}

impl Default for PathResourceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl PathResourceResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        Self {
            prefix,
            known: None,
        }
    }

    pub fn with_known(mut self, resources: impl IntoIterator<Item = ResourceObject>) -> Self {
        self.known
            .get_or_insert_with(HashSet::new)
            .extend(resources);
        self
    }

    fn parse(&self, uri: &str) -> Option<ResourceObject> {
        let rest = uri.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let (type_name, id) = rest.split_once('/')?;
        (is_segment(type_name) && is_segment(id)).then(|| ResourceObject::new(type_name, id))
    }
}

fn is_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains('/')
}

#[async_trait]
impl ResourceResolver for PathResourceResolver {
    async fn to_uri(&self, resource: &ResourceObject) -> Result<String, ResourceError> {
        if !is_segment(&resource.type_name) || !is_segment(&resource.id) {
            return Err(ResourceError::Unaddressable {
                type_name: resource.type_name.clone(),
                id: resource.id.clone(),
            });
        }
        Ok(format!("{}/{}/{}", self.prefix, resource.type_name, resource.id))
    }

    async fn from_uri(&self, uri: &str) -> Result<ResourceObject, ResourceError> {
        let resource = self
            .parse(uri)
            .ok_or_else(|| ResourceError::not_found(uri))?;
        match &self.known {
            Some(known) if !known.contains(&resource) => Err(ResourceError::not_found(uri)),
            _ => Ok(resource),
        }
    }
}
