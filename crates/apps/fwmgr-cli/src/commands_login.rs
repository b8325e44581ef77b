use crate::app::RuntimeContext;
use anyhow::Result;
use serde_json::json;

pub fn run(ctx: &mut RuntimeContext) -> Result<()> {
    ctx.with_login(|ctx| {
        let session = &ctx.session;
        let adom = session.active_domain();
        ctx.output.emit_status(&json!({
            "profile": ctx.profile_name,
            "url": ctx.settings.url,
            "user": session.username(),
            "authenticated": session.is_authenticated(),
            "adom": adom,
            "adom_visible": session.known_domains().iter().any(|known| known == adom),
            "domains": session.known_domains(),
            "last_transaction_id": session.last_transaction_id(),
        }))
    })
}
