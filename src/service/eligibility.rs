//! Eligibility rules for payment requests and sends
//!
//! Pure functions of the service settings and the requested amount. They
//! never touch the node, so external policy checks can call them freely.

use crate::config::{RequestSettings, SendSettings};
use crate::errors::AppResult;
use crate::utils::currency::{Money, MSATS_PER_SAT};

/// Resolved payment service settings with minimums already parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub request_enabled: bool,
    pub request_minimum: Money,
    pub address_type: String,
    pub conf_target: u32,
    pub send_enabled: bool,
    pub send_minimum: Money,
    pub rbf: bool,
    pub change_type: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        let request = RequestSettings::default();
        let send = SendSettings::default();
        Self {
            request_enabled: request.enabled,
            request_minimum: Money::from_msat(MSATS_PER_SAT),
            address_type: request.address_type,
            conf_target: request.conf_target,
            send_enabled: send.enabled,
            send_minimum: Money::from_msat(MSATS_PER_SAT),
            rbf: send.rbf,
            change_type: send.change_type,
        }
    }
}

impl ServiceSettings {
    pub fn from_config(request: &RequestSettings, send: &SendSettings) -> AppResult<Self> {
        Ok(Self {
            request_enabled: request.enabled,
            request_minimum: request.minimum()?,
            address_type: request.address_type.clone(),
            conf_target: request.conf_target,
            send_enabled: send.enabled,
            send_minimum: send.minimum()?,
            rbf: send.rbf,
            change_type: send.change_type.clone(),
        })
    }
}

/// Whether a payment of `amount` may be requested
pub fn can_request(settings: &ServiceSettings, amount: &Money) -> bool {
    settings.request_enabled && amount.is_greater_than_or_equal(&settings.request_minimum)
}

/// Whether a payment of `amount` may be sent
pub fn can_send(settings: &ServiceSettings, amount: &Money) -> bool {
    settings.send_enabled && amount.is_greater_than_or_equal(&settings.send_minimum)
}
