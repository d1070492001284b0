pub mod mock_llm;
pub mod mock_sink;
