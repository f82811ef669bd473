// SPDX-License-Identifier: Apache-2.0

//! §4.6 Webhook Delivery: signed, retried, dead-lettered notification of
//! newly admitted cycles.

mod delivery;
mod payload;
mod signing;

pub use delivery::{
    deliver, DeadLetterEntry, DeadLetterLog, DeliveryConfig, ReqwestWebhookSender, WebhookError,
    WebhookSender,
};
pub use payload::WebhookPayload;
pub use signing::sign;
