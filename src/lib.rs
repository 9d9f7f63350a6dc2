// Songbook - shared family lyric sheets with auto-scrolling playback
// Module declarations
mod auth;
mod commands;
mod db;
mod player;
mod settings;
mod state;

use db::connection::DatabaseConnection;
use settings::AppSettings;
use state::AppState;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // Get app data directory
            let app_dir = app.path().app_data_dir()
                .expect("Failed to get app data directory");
            let db_path = app_dir.join("songbook.db");

            // Initialize database
            let db = DatabaseConnection::new(db_path)
                .expect("Failed to initialize database");

            // Load settings, falling back to defaults on a corrupt file
            let settings = AppSettings::load(&app_dir).unwrap_or_else(|e| {
                eprintln!("[Settings] {}", e);
                AppSettings::default()
            });

            // Create and manage app state
            let app_state = AppState::new(db, settings, app_dir);
            app.manage(app_state);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::register,
            commands::sign_in,
            commands::sign_out,
            commands::current_session,
            commands::list_songs,
            commands::add_song,
            commands::get_settings,
            commands::update_settings,
            commands::open_player,
            commands::get_player_state,
            commands::close_player,
            commands::toggle_scroll,
            commands::adjust_scroll_speed,
            commands::enter_edit,
            commands::update_draft,
            commands::cancel_edit,
            commands::save_edit,
            commands::delete_song,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
