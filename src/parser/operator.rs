use crate::script::expression::{BinaryOperator, LogicalOperator, UnaryOperator};

/// Binding power of the call, index and member operators.
pub const POSTFIX_BINDING_POWER: u8 = 15;

impl UnaryOperator {
    pub fn get_binding_power(&self) -> u8 {
        match self {
            // `not a == b` negates the comparison
            UnaryOperator::Not => 5,
            UnaryOperator::Minus => 13,
        }
    }
}

impl BinaryOperator {
    pub fn get_binding_power(&self) -> (u8, u8) {
        match self {
            // Multiplicative operators
            Self::Multiply | Self::Divide | Self::Modulo => (11, 12),
            // Additive operators
            Self::Add | Self::Subtract => (9, 10),
            // Comparison, equality and membership
            Self::Equal
            | Self::NotEqual
            | Self::LessThan
            | Self::LessThanOrEqual
            | Self::GreaterThan
            | Self::GreaterThanOrEqual
            | Self::In => (7, 8),
        }
    }
}

impl LogicalOperator {
    pub fn get_binding_power(&self) -> (u8, u8) {
        match self {
            Self::And => (3, 4),
            Self::Or => (1, 2),
        }
    }
}
