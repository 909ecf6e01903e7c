//! Общие контракты (DTO) между ядром заполнения шаблона, HTTP API и CLI.

pub mod usecases;
