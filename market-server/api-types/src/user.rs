use {
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct User {
    #[schema(example = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4")]
    pub address:     String,
    pub name:        String,
    pub city:        Option<String>,
    pub latitude:    f64,
    pub longitude:   f64,
    /// Producers sell energy, consumers buy it.
    pub is_producer: bool,
    pub reputation:  i32,
}
