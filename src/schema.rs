// Matches the rolleiflex_cameras table created by DbContext::init_schema.

diesel::table! {
    rolleiflex_cameras (id) {
        id -> Integer,
        serial_start -> Integer,
        serial_end -> Integer,
        model_name -> Text,
        year_produced -> Nullable<Integer>,
        taking_lens -> Nullable<Text>,
        looking_lens -> Nullable<Text>,
        description -> Nullable<Text>,
    }
}
