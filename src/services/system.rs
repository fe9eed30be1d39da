use crate::schema::{resolver_fn, Bindings, FragmentError, GatewayService, ServiceFragment};
use serde_json::json;

const SYSTEM_SCHEMA: &str = include_str!("schema/system.graphqls");

/// Exposes details of the current transport request as `Query.requestInfo`.
#[derive(Debug, Default)]
pub struct SystemService;

impl GatewayService for SystemService {
    fn id(&self) -> &str {
        "system"
    }

    fn fragment(&self) -> Result<Option<ServiceFragment>, FragmentError> {
        let bindings = Bindings::new().with(
            "Query",
            "requestInfo",
            resolver_fn(|call| {
                let request = call.context.request();
                Ok(json!({
                    "method": request.method(),
                    "path": request.path(),
                    "userAgent": request.header("user-agent"),
                    "remoteAddress": request.peer_addr().map(|addr| addr.to_string()),
                }))
            }),
        );
        Ok(Some(ServiceFragment::new(SYSTEM_SCHEMA).with_bindings(bindings)))
    }
}
