pub mod product_api;
pub mod product_repository;
pub mod product_service;
