use crate::app::{ObjectAction, ObjectCommand, RuntimeContext};
use anyhow::Result;
use fwmgr_rpc::{ObjectKind, ObjectTarget, Outcome};
use serde_json::json;

pub fn run(ctx: &mut RuntimeContext, command: &ObjectCommand) -> Result<()> {
    match &command.action {
        ObjectAction::List { kind, package, fields } => {
            let target = target(kind, package.as_deref())?;
            let fields = fields.iter().map(String::as_str).collect::<Vec<_>>();
            let items = ctx.with_login(|ctx| Ok(ctx.session.list_objects(&target, &fields)?))?;
            ctx.output.emit_records(target.kind.as_str(), &items)
        }
        ObjectAction::Show { kind, name, package } => {
            let target = target(kind, package.as_deref())?;
            let outcome = ctx.with_login(|ctx| Ok(ctx.session.get_object(&target, name)?))?;
            match outcome {
                Outcome::Data(data) => ctx.output.emit_status(&data),
                Outcome::Done => ctx.output.emit_status(&json!({ "name": name, "data": null })),
            }
        }
        ObjectAction::Delete { kind, names, package } => {
            let target = target(kind, package.as_deref())?;
            let names = names.iter().map(String::as_str).collect::<Vec<_>>();
            ctx.with_login(|ctx| {
                if let [name] = names.as_slice() {
                    ctx.session.delete_object(&target, name)?;
                } else {
                    ctx.session.delete_objects(&target, &names)?;
                }
                Ok(())
            })?;
            ctx.output.emit_status(&json!({ "deleted": names, "kind": target.kind }))
        }
    }
}

fn target(kind: &str, package: Option<&str>) -> Result<ObjectTarget> {
    let target = ObjectTarget::new(ObjectKind::parse(kind)?);
    Ok(match package {
        Some(package) => target.in_package(package),
        None => target,
    })
}
