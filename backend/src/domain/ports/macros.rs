//! `define_port_error!`: thiserror enums with snake_case constructors.
//!
//! Each variant gets a constructor named after it whose parameters take
//! `impl Into<FieldType>`, so call sites can pass `&str` for `String` fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor generation for port error enums.
    define_port_error! {
        pub enum LookupPortError {
            Gone => "record is gone",
            Rejected { message: String } => "rejected: {message}",
            Throttled { retry_after_secs: u64 } => "throttled for {retry_after_secs}s",
            Partial { message: String, missing: u32 } => "partial: {message} ({missing} missing)",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(LookupPortError::gone(), LookupPortError::Gone);
    }

    #[test]
    fn string_fields_accept_str() {
        let err = LookupPortError::rejected("bad shape");
        assert_eq!(err.to_string(), "rejected: bad shape");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = LookupPortError::throttled(30_u64);
        assert_eq!(err.to_string(), "throttled for 30s");
    }

    #[test]
    fn mixed_fields_are_positional() {
        let err = LookupPortError::partial("lines", 2_u32);
        assert_eq!(err.to_string(), "partial: lines (2 missing)");
    }
}
