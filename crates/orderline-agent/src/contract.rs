//! Reply contract parser.
//!
//! Validates the completion service's raw text into a typed
//! [`AgentReply`]. Deliberately asymmetric: strict on the two keys that
//! drive control flow (`say_text` and `action` must be present and be
//! strings), permissive on everything else. Cart shape drift is a
//! product concern, not a stability concern, so malformed cart entries
//! are dropped element-wise and unknown sub-fields pass through.

use orderline_types::{AgentReply, CartItem, OrderAction};
use serde_json::Value;

/// Parses raw completion output. Returns `None` when the text is not a
/// JSON object or the required `say_text`/`action` keys are missing or
/// not strings; the caller then speaks the raw text instead.
pub fn parse_agent_reply(raw: &str) -> Option<AgentReply> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;

    let say_text = obj.get("say_text")?.as_str()?.to_string();
    let action = match obj.get("action")?.as_str()? {
        "finalize" => OrderAction::Finalize,
        "confirm" => OrderAction::Confirm,
        // Unknown actions are advisory only; treat them as continue.
        _ => OrderAction::Continue,
    };

    let cart = obj
        .get("cart")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<CartItem>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let customer_name = obj
        .get("customer_name")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(AgentReply {
        cart,
        customer_name,
        action,
        say_text,
    })
}
