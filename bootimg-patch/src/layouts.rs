// Offset tables for fixed-width little-endian records.
//
// A layout is declared once as an ordered field list, each field either `u32`
// or a byte width. `define_layout!` turns it into a module of constants:
//
//   offset_<field>, size_<field>, total_size
//
// Offsets are the running sum of the widths of all preceding fields, so the
// field list is the single source of truth for the on-disk format.

macro_rules! struct_item_size {
    (u32) => {
        4
    };
    (u64) => {
        8
    };
    ($sz:expr) => {
        $sz
    };
}

macro_rules! define_layout_offsets {
    ($name:ident $t:tt $(,)?) => {
        paste! {
            pub const [<size_ $name>]: usize = struct_item_size! { $t };
            pub const total_size: usize = [<offset_ $name>] + struct_item_size! { $t };
        }
    };
    ($name1:ident $t1:tt, $($name:ident $t:tt),+ $(,)?) => {
        define_layout_offsets! { @next $name1 $t1, $($name $t),+ }
    };
    (@next $name1:ident $t1:tt, $name2:ident $t2:tt $(,$name:ident $t:tt)* $(,)?) => {
        paste! {
            pub const [<size_ $name1>]: usize = struct_item_size! { $t1 };
            pub const [<offset_ $name2>]: usize = [<offset_ $name1>] + struct_item_size! { $t1 };
        }
        define_layout_offsets! { $name2 $t2 $(, $name $t)* }
    };
}

macro_rules! define_layout {
    (
        $struct_name:ident,
        initial_offset $initial_offset:tt,
        structure {$name1:ident $t1:tt $(,$name:ident $t:tt)* $(,)?} $(,)?
    ) => {
        paste! {
            #[allow(dead_code, non_upper_case_globals, nonstandard_style, unused)]
            pub mod [<mod_offsets_ $struct_name>] {
                use super::*;
                pub const [<offset_ $name1>]: usize = $initial_offset;
                define_layout_offsets! { $name1 $t1 $(, $name $t)* }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use paste::paste;

    const TAG_SIZE: usize = 6;

    define_layout! {
        Sample,
        initial_offset 2,
        structure {
            first u32,
            tag TAG_SIZE,
            wide u64,
            last u32,
        },
    }

    #[test]
    fn offsets_accumulate_field_widths() {
        assert_eq!(mod_offsets_Sample::offset_first, 2);
        assert_eq!(mod_offsets_Sample::offset_tag, 6);
        assert_eq!(mod_offsets_Sample::size_tag, TAG_SIZE);
        assert_eq!(mod_offsets_Sample::offset_wide, 12);
        assert_eq!(mod_offsets_Sample::size_wide, 8);
        assert_eq!(mod_offsets_Sample::offset_last, 20);
        assert_eq!(mod_offsets_Sample::total_size, 24);
    }

    define_layout! {
        Single,
        initial_offset 0,
        structure { only 3 },
    }

    #[test]
    fn single_field_layout() {
        assert_eq!(mod_offsets_Single::offset_only, 0);
        assert_eq!(mod_offsets_Single::total_size, 3);
    }
}
