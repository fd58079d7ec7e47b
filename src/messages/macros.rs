/// Declares the closed set of message kinds the engine understands and binds
/// each one to its prost struct in `protos`.
macro_rules! wire_messages {
    ($($name:ident = $id:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageKind {
            $($name,)*
            /// A kind tag this crate has no struct for. Passed through opaquely.
            Unknown(u16),
        }

        impl MessageKind {
            pub fn from_u16(value: u16) -> Self {
                match value {
                    $($id => MessageKind::$name,)*
                    other => MessageKind::Unknown(other),
                }
            }

            pub fn as_u16(self) -> u16 {
                match self {
                    $(MessageKind::$name => $id,)*
                    MessageKind::Unknown(other) => other,
                }
            }
        }

        $(
            impl WireMessage for protos::$name {
                const KIND: MessageKind = MessageKind::$name;
            }
        )*
    };
}

pub(crate) use wire_messages;
