// Shared by the postgres and sqlite backends: ids are 32-bit `SERIAL` /
// `INTEGER` columns on both.

diesel::table! {
    users (id) {
        id -> Integer,
        name -> Text,
        color -> Text,
    }
}

diesel::table! {
    countries (id) {
        id -> Integer,
        country_code -> Text,
        country_name -> Text,
    }
}

diesel::table! {
    visited_countries (id) {
        id -> Integer,
        user_id -> Integer,
        country_code -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, countries, visited_countries);

#[cfg(feature = "postgres")]
diesel::define_sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);
