pub mod wav_parser;
