//! Order status machine
//!
//! ```text
//! PENDENTE ──▶ CONFIRMADO ──▶ PREPARANDO ──▶ PRONTO ──▶ ENTREGUE ──▶ FINALIZADO
//!    │             │              │
//!    └─────────────┴──────────────┴──────▶ CANCELADO
//! ```
//!
//! Orders in `ENTREGUE`, `CANCELADO` or `FINALIZADO` no longer hold a table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    /// Placed by the customer, waiting for staff
    #[default]
    Pendente,
    /// Received by staff
    Confirmado,
    /// In the kitchen
    Preparando,
    /// Ready for pickup / serving
    Pronto,
    /// Handed over to the customer
    Entregue,
    /// Cancelled before delivery
    Cancelado,
    /// Closed out
    Finalizado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pendente,
        OrderStatus::Confirmado,
        OrderStatus::Preparando,
        OrderStatus::Pronto,
        OrderStatus::Entregue,
        OrderStatus::Cancelado,
        OrderStatus::Finalizado,
    ];

    /// Statuses that keep a table occupied.
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Pendente,
        OrderStatus::Confirmado,
        OrderStatus::Preparando,
        OrderStatus::Pronto,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "PENDENTE",
            OrderStatus::Confirmado => "CONFIRMADO",
            OrderStatus::Preparando => "PREPARANDO",
            OrderStatus::Pronto => "PRONTO",
            OrderStatus::Entregue => "ENTREGUE",
            OrderStatus::Cancelado => "CANCELADO",
            OrderStatus::Finalizado => "FINALIZADO",
        }
    }

    /// Whether an order in this status still occupies its table
    pub const fn is_active(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Entregue | OrderStatus::Cancelado | OrderStatus::Finalizado
        )
    }

    /// No transition leaves a terminal status
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelado | OrderStatus::Finalizado)
    }

    /// Whether staff may move an order from `self` to `next`
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pendente, Confirmado)
                | (Pendente, Cancelado)
                | (Confirmado, Preparando)
                | (Confirmado, Cancelado)
                | (Preparando, Pronto)
                | (Preparando, Cancelado)
                | (Pronto, Entregue)
                | (Entregue, Finalizado)
        )
    }

    /// The forward preparation step, if any
    pub const fn next_stage(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pendente => Some(OrderStatus::Confirmado),
            OrderStatus::Confirmado => Some(OrderStatus::Preparando),
            OrderStatus::Preparando => Some(OrderStatus::Pronto),
            OrderStatus::Pronto => Some(OrderStatus::Entregue),
            OrderStatus::Entregue => Some(OrderStatus::Finalizado),
            OrderStatus::Cancelado | OrderStatus::Finalizado => None,
        }
    }

    /// Whether the order can still be cancelled
    pub const fn is_cancellable(&self) -> bool {
        self.can_transition_to(OrderStatus::Cancelado)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_forward_path_is_allowed() {
        assert!(Pendente.can_transition_to(Confirmado));
        assert!(Confirmado.can_transition_to(Preparando));
        assert!(Preparando.can_transition_to(Pronto));
        assert!(Pronto.can_transition_to(Entregue));
        assert!(Entregue.can_transition_to(Finalizado));
    }

    #[test]
    fn test_skipping_stages_is_rejected() {
        assert!(!Pendente.can_transition_to(Preparando));
        assert!(!Pendente.can_transition_to(Entregue));
        assert!(!Confirmado.can_transition_to(Pronto));
        assert!(!Preparando.can_transition_to(Finalizado));
    }

    #[test]
    fn test_going_backwards_is_rejected() {
        assert!(!Confirmado.can_transition_to(Pendente));
        assert!(!Pronto.can_transition_to(Preparando));
        assert!(!Finalizado.can_transition_to(Entregue));
    }

    #[test]
    fn test_same_status_is_rejected() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn test_cancellation_window() {
        assert!(Pendente.is_cancellable());
        assert!(Confirmado.is_cancellable());
        assert!(Preparando.is_cancellable());
        assert!(!Pronto.is_cancellable());
        assert!(!Entregue.is_cancellable());
        assert!(!Cancelado.is_cancellable());
    }

    #[test]
    fn test_terminal_statuses_have_no_exit() {
        for from in [Cancelado, Finalizado] {
            assert!(from.is_terminal());
            assert!(from.next_stage().is_none());
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_active_set_matches_is_active() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_active(), OrderStatus::ACTIVE.contains(&status));
        }
    }

    #[test]
    fn test_next_stage_is_always_a_valid_transition() {
        for status in OrderStatus::ALL {
            if let Some(next) = status.next_stage() {
                assert!(status.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_parse_and_serde_names_agree() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("pronto".parse::<OrderStatus>().unwrap(), Pronto);
        assert!("SERVED".parse::<OrderStatus>().is_err());
    }
}
