//! Defines and implements the operations used in the AMQP Management protocol.

pub use self::{
    entity::{
        CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ReadRequest, ReadResponse,
        UpdateRequest, UpdateResponse,
    },
    node::{
        DeregisterRequest, DeregisterResponse, GetAnnotationsRequest, GetAnnotationsResponse,
        GetAttributesRequest, GetAttributesResponse, GetMgmtNodesRequest, GetMgmtNodesResponse,
        GetOperationsRequest, GetOperationsResponse, GetTypesRequest, GetTypesResponse,
        QueryRequest, QueryResponse, RegisterRequest, RegisterResponse,
    },
};

pub mod entity;
pub mod node;
