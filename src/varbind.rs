//! OID and value pairs as returned by walks and batched GETs.

use crate::oid::Oid;
use crate::value::Value;

/// One variable binding.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Binding with a NULL value, as carried in request PDUs.
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Whether the agent reported end of its MIB view for this binding.
    pub fn is_end_of_mib_view(&self) -> bool {
        matches!(self.value, Value::EndOfMibView)
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

impl From<VarBind> for (Oid, Value) {
    fn from(vb: VarBind) -> Self {
        (vb.oid, vb.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_varbind_display() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("host1"));
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.5.0 = host1");
    }

    #[test]
    fn test_varbind_end_of_mib_view() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::EndOfMibView);
        assert!(vb.is_end_of_mib_view());
        assert!(!VarBind::null(oid!(1, 3, 6, 1)).is_end_of_mib_view());
    }
}
