//! Device function table and endpoint routing
//!
//! Every operation the stock web UI performs goes through one of two POST
//! endpoints as a numbered `fun` code. The table below covers the codes the
//! login handshake needs; new codes get a variant here, not loose constants.

/// A device-side function reachable through the getter/setter endpoints.
///
/// Opcodes are the firmware's own numbering, taken from captures of the
/// stock web UI. The warm-up calls have no documented meaning; the device
/// simply refuses the login without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// First warm-up call of the login handshake.
    HandshakeOpen,
    /// Second warm-up call, issued after the login page POST.
    HandshakeArm,
    /// Credential submission; expects `Username` and `Password` parameters.
    Login,
}

impl Function {
    /// Wire opcode sent as the `fun` parameter.
    pub fn opcode(self) -> &'static str {
        match self {
            Function::HandshakeOpen => "24",
            Function::HandshakeArm => "3",
            Function::Login => "15",
        }
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Function::HandshakeOpen => "handshake-open",
            Function::HandshakeArm => "handshake-arm",
            Function::Login => "login",
        }
    }
}

/// The two fixed POST endpoints of the AJAX/XML interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Read-side endpoint.
    Getter,
    /// Write-side endpoint; login goes through here.
    Setter,
}

impl Endpoint {
    /// Path relative to the device base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Getter => "/xml/getter.xml",
            Endpoint::Setter => "/xml/setter.xml",
        }
    }
}
