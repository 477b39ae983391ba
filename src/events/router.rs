// src/events/router.rs
//
// Request/response routes.
//
// Where the bus is fire-and-forget, a route returns a JSON value to its
// caller. Renderer `invoke` calls (`settingsProvider.get`, ...) and the
// external API surface (`api/track/...`) both land here.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::events::bus::EventArgs;

pub type RouteFuture = Pin<Box<dyn Future<Output = AppResult<Value>> + Send + 'static>>;

type RouteHandler = Arc<dyn Fn(EventArgs) -> RouteFuture + Send + Sync>;

/// `(route name, handler)` as declared by a provider.
pub struct Route {
    name: String,
    handler: RouteHandler,
}

impl Route {
    pub fn new<F, Fut>(name: &str, handler: F) -> Self
    where
        F: Fn(EventArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Default)]
struct RouteTable {
    handlers: HashMap<String, RouteHandler>,
    order: Vec<String>,
}

/// Route table shared by every provider.
#[derive(Clone, Default)]
pub struct CommandRouter {
    table: Arc<RwLock<RouteTable>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A route name can only be claimed once.
    pub fn register(&self, route: Route) -> AppResult<()> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.handlers.contains_key(&route.name) {
            return Err(AppError::DuplicateRoute(route.name));
        }
        log::debug!("[ROUTER] route {}", route.name);
        table.order.push(route.name.clone());
        table.handlers.insert(route.name, route.handler);
        Ok(())
    }

    /// Release a route name. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.handlers.remove(name).is_none() {
            return false;
        }
        table.order.retain(|n| n != name);
        true
    }

    pub async fn invoke(&self, name: &str, args: EventArgs) -> AppResult<Value> {
        let handler = {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            table
                .handlers
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::RouteNotFound(name.to_string()))?
        };
        handler(args).await
    }

    /// Registered route names, in registration order.
    pub fn route_names(&self) -> Vec<String> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoke_registered_route() {
        let router = CommandRouter::new();
        router
            .register(Route::new("echo", |args| async move {
                Ok(args.into_iter().next().unwrap_or(Value::Null))
            }))
            .unwrap();

        let value = router.invoke("echo", vec![json!(42)]).await.unwrap();
        assert_eq!(value, json!(42));
        assert!(router.has_route("echo"));
    }

    #[test]
    fn test_unregister_frees_name() {
        let router = CommandRouter::new();
        router.register(Route::new("a", |_| async { Ok(Value::Null) })).unwrap();
        router.register(Route::new("b", |_| async { Ok(Value::Null) })).unwrap();

        assert!(router.unregister("a"));
        assert!(!router.unregister("a"));
        assert_eq!(router.route_names(), vec!["b".to_string()]);
        router.register(Route::new("a", |_| async { Ok(Value::Null) })).unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let router = CommandRouter::new();
        let err = router.invoke("api/missing", vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::RouteNotFound(name) if name == "api/missing"));
    }

    #[test]
    fn test_duplicate_route_rejected_and_order_kept() {
        let router = CommandRouter::new();
        router.register(Route::new("b", |_| async { Ok(Value::Null) })).unwrap();
        router.register(Route::new("a", |_| async { Ok(Value::Null) })).unwrap();
        let err = router
            .register(Route::new("b", |_| async { Ok(Value::Null) }))
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateRoute(_)));
        assert_eq!(router.route_names(), vec!["b".to_string(), "a".to_string()]);
    }
}
