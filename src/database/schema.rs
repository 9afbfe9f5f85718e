table! {
    services (id) {
        id -> Integer,
        key -> Text,
        name -> Text,
        enabled -> Bool,
    }
}

table! {
    shows (id) {
        id -> Integer,
        name -> Text,
        has_source -> Bool,
    }
}

table! {
    streams (id) {
        id -> Integer,
        service -> Integer,
        show -> Integer,
        site_key -> Nullable<Text>,
        remote_offset -> Integer,
        display_offset -> Integer,
        active -> Bool,
    }
}

table! {
    episodes (id) {
        id -> Integer,
        show -> Integer,
        number -> Integer,
        post_url -> Text,
    }
}

allow_tables_to_appear_in_same_query!(services, shows, streams, episodes);
