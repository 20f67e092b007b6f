pub(crate) mod entity;

pub(crate) use entity::{
    ActiveModel as VideoActiveModel, Column as VideoColumn, Entity as VideoEntity, Model as VideoModel,
};
