use {
    serde_json::{
        Map,
        Value,
    },
    std::collections::HashMap,
};

pub type EventArgs = Map<String, Value>;

/// Chain response reduced to the parts the market reads.
///
/// The chain gateway has returned receipts in several shapes over time, and this is the only place
/// that knows about them:
/// - `{"tx": .., "logs": [{"event": name, "args": {..}}]}`
/// - `{"receiptId": .., "events": [{"name": name, "args": {..}}]}`
/// - `{"transactionHash": .., "events": {name: {"returnValues": {..}}}}`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainReceipt {
    pub receipt_id: Option<String>,
    pub events:     HashMap<String, EventArgs>,
}

const RECEIPT_ID_KEYS: [&str; 3] = ["receiptId", "transactionHash", "tx"];

impl ChainReceipt {
    pub fn from_json(value: &Value) -> Self {
        let receipt_id = RECEIPT_ID_KEYS
            .iter()
            .find_map(|key| value.get(key).and_then(render_scalar))
            .filter(|id| !id.is_empty());

        let mut receipt = Self {
            receipt_id,
            events: HashMap::new(),
        };

        if let Some(logs) = value.get("logs").and_then(Value::as_array) {
            for log in logs {
                receipt.push_event(log.get("event"), log.get("args"));
            }
        }
        match value.get("events") {
            Some(Value::Array(events)) => {
                for event in events {
                    let name = event.get("name").or_else(|| event.get("event"));
                    receipt.push_event(name, event.get("args"));
                }
            }
            Some(Value::Object(events)) => {
                for (name, event) in events {
                    let args = event.get("returnValues").unwrap_or(event);
                    if let Some(args) = args.as_object() {
                        receipt
                            .events
                            .entry(name.clone())
                            .or_insert_with(|| args.clone());
                    }
                }
            }
            _ => {}
        }
        receipt
    }

    fn push_event(&mut self, name: Option<&Value>, args: Option<&Value>) {
        let Some(name) = name.and_then(Value::as_str) else {
            return;
        };
        let args = args.and_then(Value::as_object).cloned().unwrap_or_default();
        self.events.entry(name.to_string()).or_insert(args);
    }

    pub fn event(&self, name: &str) -> Option<&EventArgs> {
        self.events.get(name)
    }

    /// Reads a string or numeric event argument as a string.
    pub fn event_arg(&self, event: &str, arg: &str) -> Option<String> {
        self.event(event)?.get(arg).and_then(render_scalar)
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
