/// Structured guard events tagged with the request ID.
///
/// Every event carries `request_id` and `handler` fields so a single
/// request's decisions can be followed through a subscriber. Flash message
/// text is never logged, only its category.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GuardLog<'a> {
    request_id: &'a str,
}

impl<'a> GuardLog<'a> {
    pub(crate) fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    #[cfg(test)]
    pub(crate) fn request_id(&self) -> &str {
        self.request_id
    }

    /// All guards on `scope` passed.
    pub(crate) fn passed(&self, scope: &str) {
        tracing::debug!(
            request_id = %self.request_id,
            handler = %scope,
            "requirements passed"
        );
    }

    /// A guard on `scope` failed and the request is redirected.
    pub(crate) fn redirected(&self, scope: &str, location: &str, flashed: Option<&str>) {
        match flashed {
            Some(category) => tracing::info!(
                request_id = %self.request_id,
                handler = %scope,
                location = %location,
                category = %category,
                "requirement failed, redirecting with flash"
            ),
            None => tracing::info!(
                request_id = %self.request_id,
                handler = %scope,
                location = %location,
                "requirement failed, redirecting"
            ),
        }
    }
}
