use crate::app::{CallArgs, RuntimeContext};
use anyhow::{Context, Result};
use fwmgr_rpc::{Method, Outcome, ParamObject};
use serde_json::{json, Value};

pub fn run(ctx: &mut RuntimeContext, args: &CallArgs) -> Result<()> {
    let method = Method::parse(&args.method)?;
    let param = build_param(args)?;

    let outcome = ctx.with_login(|ctx| Ok(ctx.session.exec_param(method, param)?))?;
    match outcome {
        Outcome::Data(Value::Array(items)) => ctx.output.emit_records(&args.url, &items),
        Outcome::Data(data) => ctx.output.emit_status(&data),
        Outcome::Done => ctx.output.emit_status(&json!({ "status": "ok", "url": args.url })),
    }
}

pub(crate) fn build_param(args: &CallArgs) -> Result<ParamObject> {
    let mut param = ParamObject::new(args.url.clone());
    if let Some(raw) = &args.data {
        let data: Value = serde_json::from_str(raw).context("--data is not valid JSON")?;
        param = param.with_data(data);
    }
    let fields = args
        .fields
        .iter()
        .map(|field| field.trim())
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>();
    if !fields.is_empty() {
        param = param.with_fields(fields);
    }
    Ok(param)
}
