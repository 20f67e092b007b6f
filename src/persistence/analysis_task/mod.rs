pub(crate) mod entity;

pub(crate) use entity::{
    ActiveModel as AnalysisTaskActiveModel, Column as AnalysisTaskColumn, Entity as AnalysisTaskEntity, Model as AnalysisTaskModel,
};
